use std::sync::Arc;

use tracing::{debug, warn};

use crate::result::NotionError;
use crate::workspace::WorkspaceClient;

/// Checks a candidate integration token against the Notion API without
/// storing it.
pub struct ValidateTokenInteractor {
    client: Arc<dyn WorkspaceClient>,
}

impl ValidateTokenInteractor {
    pub fn new(client: Arc<dyn WorkspaceClient>) -> Self {
        Self { client }
    }

    pub async fn validate(&self, token: &str) -> Result<(), NotionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(NotionError::InvalidToken);
        }
        match self.client.check_token(token).await {
            Ok(()) => {
                debug!("Notion accepted the integration token");
                Ok(())
            }
            Err(failure) => {
                let err = NotionError::from(&failure);
                warn!("Notion rejected the integration token: {} ({})", err, failure);
                Err(err)
            }
        }
    }
}
