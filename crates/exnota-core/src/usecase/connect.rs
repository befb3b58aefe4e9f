use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use exnota_auth_bridge::StoredToken;

use crate::repository::TokenRepository;
use crate::result::{ConnectError, NotionError};
use crate::usecase::SetTokenInteractor;
use crate::workspace::WorkspaceClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub granted_page_ids: Vec<String>,
}

/// Completes the OAuth flow: code exchange, persistence, granted pages.
pub struct ConnectInteractor {
    client: Arc<dyn WorkspaceClient>,
    set_token: SetTokenInteractor,
}

impl ConnectInteractor {
    pub fn new(client: Arc<dyn WorkspaceClient>, repo: Arc<dyn TokenRepository>) -> Self {
        Self {
            client,
            set_token: SetTokenInteractor::new(repo),
        }
    }

    /// Exchange `code` and store the resulting token.
    ///
    /// Not safe to retry: the authorization code is single-use. A storage
    /// failure after a successful exchange is reported as `storage-error`
    /// and the grant is left in place. With zero shared pages the token is
    /// still stored and `no-pages-granted` is returned.
    pub async fn connect(
        &self,
        code: &str,
        redirect_url: &str,
    ) -> Result<ConnectResponse, ConnectError> {
        if code.trim().is_empty() {
            return Err(NotionError::Request.into());
        }

        let grant = self
            .client
            .exchange_code(code, redirect_url)
            .await
            .map_err(|failure| {
                warn!("OAuth code exchange failed: {}", failure);
                ConnectError::from(NotionError::from(&failure))
            })?;

        let token = StoredToken::from(grant);
        if self.set_token.store(&token).await.is_err() {
            error!("Notion grant was issued but could not be stored");
            return Err(ConnectError::StorageError);
        }

        let granted_page_ids = self
            .client
            .granted_page_ids(&token.access_token)
            .await
            .map_err(|failure| {
                warn!("Listing granted pages failed: {}", failure);
                ConnectError::from(NotionError::from(&failure))
            })?;

        if granted_page_ids.is_empty() {
            warn!("Notion connected but no pages were shared with the integration");
            return Err(ConnectError::NoPagesGranted);
        }

        info!(
            "Connected to Notion with {} granted pages",
            granted_page_ids.len()
        );
        Ok(ConnectResponse { granted_page_ids })
    }
}
