//! Token persistence seam.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use exnota_auth_bridge::{FileTokenStore, KeyringTokenStore, StoredToken};

use crate::config::StorageBackend;
use crate::ExnotaPaths;

/// Key-value persistence for the single Notion token.
///
/// Implementations report rich errors; interactors reduce them to tags.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn load(&self) -> Result<Option<StoredToken>>;
    async fn save(&self, token: &StoredToken) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl TokenRepository for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self.get()?)
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        Ok(self.set(token.clone())?)
    }

    async fn clear(&self) -> Result<()> {
        Ok(FileTokenStore::clear(self)?)
    }
}

#[async_trait]
impl TokenRepository for KeyringTokenStore {
    async fn load(&self) -> Result<Option<StoredToken>> {
        Ok(self.get()?)
    }

    async fn save(&self, token: &StoredToken) -> Result<()> {
        Ok(self.set(token.clone())?)
    }

    async fn clear(&self) -> Result<()> {
        Ok(KeyringTokenStore::clear(self)?)
    }
}

/// Open the repository selected in the configuration.
pub fn open_repository(
    backend: StorageBackend,
    paths: &ExnotaPaths,
) -> Result<Arc<dyn TokenRepository>> {
    let repo: Arc<dyn TokenRepository> = match backend {
        StorageBackend::File => Arc::new(FileTokenStore::load(&paths.auth_path)?),
        StorageBackend::Keyring => Arc::new(KeyringTokenStore::new()),
    };
    Ok(repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_through_trait() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExnotaPaths::from_base(dir.path().to_path_buf());
        let repo = open_repository(StorageBackend::File, &paths).unwrap();

        assert!(repo.load().await.unwrap().is_none());
        repo.save(&StoredToken::new("secret_1")).await.unwrap();
        assert_eq!(repo.load().await.unwrap().unwrap().access_token, "secret_1");
        repo.clear().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }
}
