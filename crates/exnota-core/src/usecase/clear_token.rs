use std::sync::Arc;

use tracing::{info, warn};

use crate::repository::TokenRepository;
use crate::result::RepositoryError;

pub struct ClearTokenInteractor {
    repo: Arc<dyn TokenRepository>,
}

impl ClearTokenInteractor {
    pub fn new(repo: Arc<dyn TokenRepository>) -> Self {
        Self { repo }
    }

    /// Forget the stored token. Clearing an empty store succeeds.
    pub async fn clear_token(&self) -> Result<(), RepositoryError> {
        if let Err(err) = self.repo.clear().await {
            warn!("Failed to clear token: {:#}", err);
            return Err(RepositoryError::StorageError);
        }
        info!("Cleared Notion token");
        Ok(())
    }
}
