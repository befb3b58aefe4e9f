pub mod connect;
pub mod disconnect;
pub mod set_token;
pub mod token;
pub mod validate;

use anyhow::{anyhow, Result};

use exnota_core::result::ErrorTag;
use exnota_messaging::CallError;

use crate::{messages, ui};

/// Show the user-facing text for a failed call and turn it into the
/// command's error.
pub(crate) fn report<E: ErrorTag>(err: CallError<E>) -> anyhow::Error {
    ui::error(messages::user_message(err.tag()));
    anyhow!(err)
}

/// Token from the command line, or prompt for it.
pub(crate) fn token_arg(token: Option<String>) -> Result<String> {
    match token {
        Some(token) => Ok(token),
        None => ui::prompt_password("Paste your Notion integration token"),
    }
}
