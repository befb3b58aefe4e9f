//! The connect flow: start, step 1, step 2 (authorize + exchange), select
//! page.
//!
//! One [`ConnectFlow`] drives one screen at a time and publishes every
//! transition on a watch channel. Each run carries an instance number;
//! [`ConnectFlow::reset`] starts a new instance and anything still in
//! flight for the old one is dropped when it comes back.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use exnota_auth_bridge::oauth::{authorize_url, parse_redirect, RedirectOutcome};
use exnota_core::result::{ClientIdError, ConnectError};
use exnota_core::usecase::ConnectResponse;
use exnota_messaging::{CallError, MessageClient};

use crate::authorizer::Authorizer;

mod state;

pub use state::{FlowError, FlowState, Screen, StepError};

/// The two background calls the flow needs.
#[async_trait]
pub trait ConnectBackend: Send + Sync {
    async fn get_client_id(&self) -> Result<String, CallError<ClientIdError>>;

    async fn connect(
        &self,
        code: &str,
        redirect_url: &str,
    ) -> Result<ConnectResponse, CallError<ConnectError>>;
}

#[async_trait]
impl ConnectBackend for MessageClient {
    async fn get_client_id(&self) -> Result<String, CallError<ClientIdError>> {
        MessageClient::get_client_id(self).await
    }

    async fn connect(
        &self,
        code: &str,
        redirect_url: &str,
    ) -> Result<ConnectResponse, CallError<ConnectError>> {
        MessageClient::connect(self, code, redirect_url).await
    }
}

pub struct ConnectFlow {
    backend: Arc<dyn ConnectBackend>,
    authorizer: Arc<dyn Authorizer>,
    authorize_base: String,
    redirect_url: String,
    state: watch::Sender<FlowState>,
}

impl ConnectFlow {
    pub fn new(
        backend: Arc<dyn ConnectBackend>,
        authorizer: Arc<dyn Authorizer>,
        authorize_base: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(FlowState {
            instance: 1,
            screen: Screen::ConnectStart,
        });
        Self {
            backend,
            authorizer,
            authorize_base: authorize_base.into(),
            redirect_url: redirect_url.into(),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FlowState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FlowState {
        self.state.borrow().clone()
    }

    pub fn start(&self) -> Result<(), FlowError> {
        self.transition("start", |screen| match screen {
            Screen::ConnectStart => Some(Screen::ConnectStep1),
            _ => None,
        })
    }

    pub fn next(&self) -> Result<(), FlowError> {
        self.transition("next", |screen| match screen {
            Screen::ConnectStep1 => Some(Screen::step2()),
            _ => None,
        })
    }

    /// Run the authorization and code exchange from step 2.
    ///
    /// Failures land in the step 2 screen as a [`StepError`] and return
    /// `Ok`. `Err` means the call was refused or its result was discarded.
    pub async fn give_access(&self) -> Result<(), FlowError> {
        let instance = self.begin_connecting()?;

        let client_id = match self.backend.get_client_id().await {
            Ok(client_id) => client_id,
            Err(err) => {
                warn!("Could not fetch the OAuth client id: {}", err);
                return self.fail(instance, StepError::ClientId(err.tag()));
            }
        };
        self.ensure_current(instance)?;

        let request = match authorize_url(&self.authorize_base, &client_id, &self.redirect_url) {
            Ok(request) => request,
            Err(err) => {
                warn!("Could not build the authorize URL: {}", err);
                return self.fail(instance, StepError::Generic);
            }
        };

        let response_url = match self.authorizer.launch(&request.url).await {
            Ok(url) => url,
            Err(err) => {
                info!("Authorization window ended without a redirect: {}", err);
                return self.fail(instance, StepError::DeniedAccess);
            }
        };
        self.ensure_current(instance)?;

        let code = match parse_redirect(&response_url, &request.state) {
            RedirectOutcome::Code(code) => code,
            outcome => {
                warn!("Redirect rejected: {:?}", outcome);
                return self.fail(instance, StepError::Generic);
            }
        };

        match self.backend.connect(&code, &self.redirect_url).await {
            Ok(response) => {
                debug!("Granted {} pages", response.granted_page_ids.len());
                self.apply(instance, |screen| {
                    *screen = Screen::select_page(response.granted_page_ids);
                })
            }
            Err(CallError::Domain(ConnectError::NoPagesGranted)) => {
                self.fail(instance, StepError::NoPages)
            }
            Err(err) => self.fail(instance, StepError::Connect(err.tag())),
        }
    }

    /// Record the chosen page.
    pub fn select_page(&self, page_id: &str) -> Result<(), FlowError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match &mut state.screen {
            Screen::ConnectSelectPage {
                granted_page_ids,
                selected,
                ..
            } => {
                if granted_page_ids.iter().any(|id| id == page_id) {
                    *selected = Some(page_id.to_string());
                    true
                } else {
                    outcome = Err(FlowError::UnknownPage(page_id.to_string()));
                    false
                }
            }
            other => {
                outcome = Err(FlowError::InvalidTransition {
                    action: "select_page",
                    screen: other.name(),
                });
                false
            }
        });
        outcome
    }

    /// Abandon the current instance and go back to the start screen.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            state.instance += 1;
            state.screen = Screen::ConnectStart;
        });
        debug!("Connect flow reset to instance {}", self.state.borrow().instance);
    }

    fn transition(
        &self,
        action: &'static str,
        next: impl FnOnce(&Screen) -> Option<Screen>,
    ) -> Result<(), FlowError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match next(&state.screen) {
            Some(screen) => {
                state.screen = screen;
                true
            }
            None => {
                outcome = Err(FlowError::InvalidTransition {
                    action,
                    screen: state.screen.name(),
                });
                false
            }
        });
        outcome
    }

    fn begin_connecting(&self) -> Result<u64, FlowError> {
        let mut outcome = Err(FlowError::AlreadyConnecting);
        self.state.send_if_modified(|state| match &mut state.screen {
            Screen::ConnectStep2 {
                connecting: true, ..
            } => false,
            Screen::ConnectStep2 { connecting, error } => {
                *connecting = true;
                *error = None;
                outcome = Ok(state.instance);
                true
            }
            other => {
                outcome = Err(FlowError::InvalidTransition {
                    action: "give_access",
                    screen: other.name(),
                });
                false
            }
        });
        outcome
    }

    fn ensure_current(&self, instance: u64) -> Result<(), FlowError> {
        if self.state.borrow().instance == instance {
            Ok(())
        } else {
            debug!("Dropping result for abandoned flow {}", instance);
            Err(FlowError::Stale)
        }
    }

    fn fail(&self, instance: u64, step_error: StepError) -> Result<(), FlowError> {
        self.apply(instance, |screen| {
            if let Screen::ConnectStep2 { connecting, error } = screen {
                *connecting = false;
                *error = Some(step_error);
            }
        })
    }

    fn apply(&self, instance: u64, update: impl FnOnce(&mut Screen)) -> Result<(), FlowError> {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.instance != instance {
                return false;
            }
            update(&mut state.screen);
            applied = true;
            true
        });
        if applied {
            Ok(())
        } else {
            debug!("Dropping result for abandoned flow {}", instance);
            Err(FlowError::Stale)
        }
    }
}
