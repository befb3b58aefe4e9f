//! Workspace API seam and the mapping from raw API failures to tags.

use async_trait::async_trait;

use exnota_auth_bridge::{ApiFailure, NotionClient, NotionGrant};

use crate::result::NotionError;

/// The parts of the Notion API the interactors depend on.
#[async_trait]
pub trait WorkspaceClient: Send + Sync {
    /// Succeeds if the token is accepted by the API.
    async fn check_token(&self, token: &str) -> Result<(), ApiFailure>;

    async fn exchange_code(&self, code: &str, redirect_url: &str) -> Result<NotionGrant, ApiFailure>;

    async fn granted_page_ids(&self, token: &str) -> Result<Vec<String>, ApiFailure>;
}

#[async_trait]
impl WorkspaceClient for NotionClient {
    async fn check_token(&self, token: &str) -> Result<(), ApiFailure> {
        self.current_user(token).await
    }

    async fn exchange_code(&self, code: &str, redirect_url: &str) -> Result<NotionGrant, ApiFailure> {
        NotionClient::exchange_code(self, code, redirect_url).await
    }

    async fn granted_page_ids(&self, token: &str) -> Result<Vec<String>, ApiFailure> {
        NotionClient::granted_page_ids(self, token).await
    }
}

/// Map an HTTP status to a tag:
///
/// | status | tag |
/// |---|---|
/// | 401 | `notion-invalid-token` |
/// | 429 | `notion-rate-limit-error` |
/// | other 4xx | `notion-request-error` |
/// | 5xx | `notion-other-error` |
/// | anything else | `unknown-error` |
pub fn classify_status(status: u16) -> NotionError {
    match status {
        401 => NotionError::InvalidToken,
        429 => NotionError::RateLimit,
        400..=499 => NotionError::Request,
        500..=599 => NotionError::Other,
        _ => NotionError::Unknown,
    }
}

impl From<&ApiFailure> for NotionError {
    fn from(failure: &ApiFailure) -> Self {
        match failure {
            ApiFailure::Status { status, .. } => classify_status(*status),
            ApiFailure::Network(_) => NotionError::Other,
            ApiFailure::Malformed(_) | ApiFailure::MissingCredentials => NotionError::Unknown,
        }
    }
}
