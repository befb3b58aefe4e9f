use std::sync::Arc;

use tracing::{debug, warn};

use exnota_core::result::{ClientIdError, ConnectError, NotionError, RepositoryError, SetTokenError};
use exnota_core::usecase::ConnectResponse;

use crate::catalog::{
    ClearToken, Connect, ConnectInput, Empty, GetClientId, GetToken, SetToken, TokenInput,
    ValidateIntegrationToken,
};
use crate::error::CallError;
use crate::message::{Message, Request};
use crate::transport::Transport;
use crate::wire::decode_reply;

/// UI-side entry point for talking to the background.
///
/// Every call resolves to a `Result`. Delivery problems of any kind become
/// [`CallError::Messaging`]; nothing here returns a transport error.
#[derive(Clone)]
pub struct MessageClient {
    transport: Arc<dyn Transport>,
}

impl MessageClient {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn call<M: Message>(
        &self,
        input: &M::Input,
    ) -> Result<M::Output, CallError<M::Error>> {
        let data = serde_json::to_value(input).map_err(|err| {
            warn!("Could not encode input for {}: {}", M::NAME, err);
            CallError::Messaging
        })?;

        let reply = self
            .transport
            .send(Request::new(M::NAME, data))
            .await
            .map_err(|err| {
                warn!("{} did not reach the background: {}", M::NAME, err);
                CallError::Messaging
            })?;

        match decode_reply::<M::Output, M::Error>(reply) {
            Ok(result) => {
                if let Err(err) = &result {
                    debug!("{} failed with {}", M::NAME, err);
                }
                result
            }
            Err(err) => {
                warn!("Malformed reply for {}: {}", M::NAME, err);
                Err(CallError::Messaging)
            }
        }
    }

    pub async fn get_token(&self) -> Result<Option<String>, CallError<RepositoryError>> {
        Ok(self.call::<GetToken>(&Empty {}).await?.token)
    }

    pub async fn set_token(&self, token: &str) -> Result<(), CallError<SetTokenError>> {
        self.call::<SetToken>(&TokenInput {
            token: token.to_string(),
        })
        .await
        .map(|_| ())
    }

    pub async fn clear_token(&self) -> Result<(), CallError<RepositoryError>> {
        self.call::<ClearToken>(&Empty {}).await.map(|_| ())
    }

    pub async fn validate_integration_token(
        &self,
        token: &str,
    ) -> Result<(), CallError<NotionError>> {
        self.call::<ValidateIntegrationToken>(&TokenInput {
            token: token.to_string(),
        })
        .await
        .map(|_| ())
    }

    pub async fn get_client_id(&self) -> Result<String, CallError<ClientIdError>> {
        Ok(self.call::<GetClientId>(&Empty {}).await?.client_id)
    }

    pub async fn connect(
        &self,
        code: &str,
        redirect_url: &str,
    ) -> Result<ConnectResponse, CallError<ConnectError>> {
        self.call::<Connect>(&ConnectInput {
            code: code.to_string(),
            redirect_url: redirect_url.to_string(),
        })
        .await
    }
}
