use tracing::warn;

use crate::config::ExnotaConfig;
use crate::result::ClientIdError;

/// Hands the public OAuth client id to the UI. The secret never leaves the
/// background.
pub struct ClientIdInteractor {
    client_id: Option<String>,
}

impl ClientIdInteractor {
    pub fn new(client_id: Option<String>) -> Self {
        Self { client_id }
    }

    pub fn from_config(config: &ExnotaConfig) -> Self {
        Self::new(config.client_id().map(str::to_string))
    }

    pub fn get_client_id(&self) -> Result<String, ClientIdError> {
        match self.client_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => {
                warn!("No Notion OAuth client id configured");
                Err(ClientIdError::FetchingClientId)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_present() {
        let interactor = ClientIdInteractor::new(Some("abc-123".to_string()));
        assert_eq!(interactor.get_client_id(), Ok("abc-123".to_string()));
    }

    #[test]
    fn test_client_id_missing_or_blank() {
        assert_eq!(
            ClientIdInteractor::new(None).get_client_id(),
            Err(ClientIdError::FetchingClientId)
        );
        assert_eq!(
            ClientIdInteractor::new(Some(" ".to_string())).get_client_id(),
            Err(ClientIdError::FetchingClientId)
        );
    }

    #[test]
    fn test_client_id_from_default_config() {
        let interactor = ClientIdInteractor::from_config(&ExnotaConfig::default());
        assert_eq!(interactor.get_client_id(), Err(ClientIdError::FetchingClientId));
    }
}
