use std::sync::Arc;

use tracing::{info, warn};

use exnota_auth_bridge::StoredToken;

use crate::repository::TokenRepository;
use crate::result::{RepositoryError, SetTokenError};

pub struct SetTokenInteractor {
    repo: Arc<dyn TokenRepository>,
}

impl SetTokenInteractor {
    pub fn new(repo: Arc<dyn TokenRepository>) -> Self {
        Self { repo }
    }

    /// Store a bare token string.
    pub async fn set_token(&self, token: &str) -> Result<(), SetTokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SetTokenError::InvalidToken);
        }
        self.store(&StoredToken::new(token)).await?;
        Ok(())
    }

    /// Store a full token record, e.g. one built from an OAuth grant.
    pub async fn store(&self, token: &StoredToken) -> Result<(), RepositoryError> {
        if let Err(err) = self.repo.save(token).await {
            warn!("Failed to store token: {:#}", err);
            return Err(RepositoryError::StorageError);
        }
        info!("Stored Notion token");
        Ok(())
    }
}
