use std::fmt;

/// Why the last attempt on a screen failed. Rendered through
/// [`crate::messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// `auth.getClientId` failed with this tag.
    ClientId(&'static str),
    /// The authorization window errored or was closed.
    DeniedAccess,
    /// The redirect carried no usable code.
    Generic,
    /// Connected, but no page was shared with the integration.
    NoPages,
    /// `auth.connect` failed with this tag.
    Connect(&'static str),
}

impl StepError {
    pub fn tag(&self) -> &'static str {
        match self {
            StepError::ClientId(tag) | StepError::Connect(tag) => tag,
            StepError::DeniedAccess => "denied-access",
            StepError::Generic => "generic",
            StepError::NoPages => "no-pages-granted",
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    ConnectStart,
    ConnectStep1,
    ConnectStep2 {
        connecting: bool,
        error: Option<StepError>,
    },
    ConnectSelectPage {
        selecting: bool,
        error: Option<StepError>,
        granted_page_ids: Vec<String>,
        selected: Option<String>,
    },
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::ConnectStart => "connect-start",
            Screen::ConnectStep1 => "connect-step1",
            Screen::ConnectStep2 { .. } => "connect-step2",
            Screen::ConnectSelectPage { .. } => "connect-select-page",
        }
    }

    pub(crate) fn step2() -> Self {
        Screen::ConnectStep2 {
            connecting: false,
            error: None,
        }
    }

    pub(crate) fn select_page(granted_page_ids: Vec<String>) -> Self {
        Screen::ConnectSelectPage {
            selecting: false,
            error: None,
            granted_page_ids,
            selected: None,
        }
    }
}

/// What a renderer observes: the current screen of one flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    pub instance: u64,
    pub screen: Screen,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("{action} is not possible on {screen}")]
    InvalidTransition {
        action: &'static str,
        screen: &'static str,
    },
    #[error("a connect attempt is already running")]
    AlreadyConnecting,
    #[error("page {0} was not granted")]
    UnknownPage(String),
    /// The flow was reset while this operation was waiting.
    #[error("flow was abandoned")]
    Stale,
}
