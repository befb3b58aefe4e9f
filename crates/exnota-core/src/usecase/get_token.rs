use std::sync::Arc;

use tracing::warn;

use crate::repository::TokenRepository;
use crate::result::RepositoryError;

pub struct GetTokenInteractor {
    repo: Arc<dyn TokenRepository>,
}

impl GetTokenInteractor {
    pub fn new(repo: Arc<dyn TokenRepository>) -> Self {
        Self { repo }
    }

    /// The stored access token, or `None` if nothing is stored yet.
    pub async fn get_token(&self) -> Result<Option<String>, RepositoryError> {
        match self.repo.load().await {
            Ok(token) => Ok(token.map(|t| t.access_token)),
            Err(err) => {
                warn!("Failed to read stored token: {:#}", err);
                Err(RepositoryError::StorageError)
            }
        }
    }
}
