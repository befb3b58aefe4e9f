//! English text for every error tag the UI can end up showing.

use crate::flow::StepError;

const FALLBACK: &str = "Something went wrong. Please try again.";

pub fn user_message(tag: &str) -> &'static str {
    match tag {
        "storage-error" => "Could not read or write the saved Notion token.",
        "invalid-token" => "That token is empty. Paste the whole integration token.",
        "fetching-client-id" => {
            "Notion sign-in is not configured. Set the OAuth client id and try again."
        }
        "notion-invalid-token" => "Notion did not accept this token. Check it and try again.",
        "notion-rate-limit-error" => "Notion is busy right now. Wait a moment and try again.",
        "notion-request-error" => "Notion rejected the request. Please start over.",
        "notion-other-error" => "Notion is having trouble. Try again later.",
        "no-pages-granted" => {
            "Connected, but no pages were shared. Share at least one page with Exnota in Notion."
        }
        "denied-access" => "Access to Notion was not granted.",
        "messaging-error" => "Could not reach the Exnota background. Is exnota-background running?",
        _ => FALLBACK,
    }
}

pub fn step_error_message(error: &StepError) -> &'static str {
    user_message(error.tag())
}
