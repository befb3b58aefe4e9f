use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use exnota_core::usecase::{
    ClearTokenInteractor, ClientIdInteractor, ConnectInteractor, GetTokenInteractor,
    SetTokenInteractor, ValidateTokenInteractor,
};
use exnota_core::{open_repository, ExnotaConfig, ExnotaPaths, TokenRepository, WorkspaceClient};
use exnota_auth_bridge::NotionClient;
use exnota_messaging::catalog::{
    ClearToken, ClientIdPayload, Connect, ConnectInput, Empty, GetClientId, GetToken, SetToken,
    TokenInput, TokenPayload, ValidateIntegrationToken, ValidationPayload, ValidationResult,
};
use exnota_messaging::{Dispatcher, RegistrationError};

/// What the handlers run against.
pub struct Services {
    pub repo: Arc<dyn TokenRepository>,
    pub workspace: Arc<dyn WorkspaceClient>,
    pub client_id: Option<String>,
}

impl Services {
    pub fn from_config(config: &ExnotaConfig, paths: &ExnotaPaths) -> Result<Self> {
        let repo = open_repository(config.storage.backend, paths)?;

        let mut client = NotionClient::with_timeouts(
            config.notion.api_base_url.as_str(),
            config.notion.request_timeout(),
            config.notion.connect_timeout(),
        )
        .context("Failed to build Notion HTTP client")?
        .with_notion_version(config.notion.notion_version.as_str());
        match (config.client_id(), config.client_secret()) {
            (Some(id), Some(secret)) => client = client.with_oauth_credentials(id, secret),
            (Some(_), None) => warn!("Notion client secret missing; OAuth connect will fail"),
            _ => warn!("Notion OAuth client not configured; only integration tokens will work"),
        }

        Ok(Self {
            repo,
            workspace: Arc::new(client),
            client_id: config.client_id().map(str::to_string),
        })
    }
}

/// Register every background message. Fails if any name is taken already.
pub fn register_handlers(
    dispatcher: &mut Dispatcher,
    services: &Services,
) -> Result<(), RegistrationError> {
    let get_token = Arc::new(GetTokenInteractor::new(services.repo.clone()));
    dispatcher.register::<GetToken, _, _>(move |_: Empty| {
        let get_token = get_token.clone();
        async move { get_token.get_token().await.map(|token| TokenPayload { token }) }
    })?;

    let set_token = Arc::new(SetTokenInteractor::new(services.repo.clone()));
    dispatcher.register::<SetToken, _, _>(move |input: TokenInput| {
        let set_token = set_token.clone();
        async move { set_token.set_token(&input.token).await.map(|_| Empty {}) }
    })?;

    let clear_token = Arc::new(ClearTokenInteractor::new(services.repo.clone()));
    dispatcher.register::<ClearToken, _, _>(move |_: Empty| {
        let clear_token = clear_token.clone();
        async move { clear_token.clear_token().await.map(|_| Empty {}) }
    })?;

    let validate = Arc::new(ValidateTokenInteractor::new(services.workspace.clone()));
    dispatcher.register::<ValidateIntegrationToken, _, _>(move |input: TokenInput| {
        let validate = validate.clone();
        async move {
            validate.validate(&input.token).await.map(|_| ValidationPayload {
                result: ValidationResult::Success,
            })
        }
    })?;

    let client_id = Arc::new(ClientIdInteractor::new(services.client_id.clone()));
    dispatcher.register::<GetClientId, _, _>(move |_: Empty| {
        let result = client_id
            .get_client_id()
            .map(|client_id| ClientIdPayload { client_id });
        async move { result }
    })?;

    let connect = Arc::new(ConnectInteractor::new(
        services.workspace.clone(),
        services.repo.clone(),
    ));
    dispatcher.register::<Connect, _, _>(move |input: ConnectInput| {
        let connect = connect.clone();
        async move { connect.connect(&input.code, &input.redirect_url).await }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use exnota_auth_bridge::{ApiFailure, FileTokenStore, NotionGrant};
    use exnota_core::result::{ClientIdError, ConnectError, NotionError, SetTokenError};
    use exnota_messaging::catalog::MESSAGE_NAMES;
    use exnota_messaging::{CallError, MessageClient};

    use super::*;

    struct FakeNotion {
        pages: Vec<String>,
    }

    #[async_trait]
    impl WorkspaceClient for FakeNotion {
        async fn check_token(&self, token: &str) -> Result<(), ApiFailure> {
            match token {
                "secret_ok" => Ok(()),
                "secret_busy" => Err(ApiFailure::Status {
                    status: 429,
                    code: Some("rate_limited".to_string()),
                }),
                _ => Err(ApiFailure::Status {
                    status: 401,
                    code: Some("unauthorized".to_string()),
                }),
            }
        }

        async fn exchange_code(
            &self,
            code: &str,
            _redirect_url: &str,
        ) -> Result<NotionGrant, ApiFailure> {
            if code != "abc123" {
                return Err(ApiFailure::Status {
                    status: 400,
                    code: Some("invalid_grant".to_string()),
                });
            }
            Ok(NotionGrant {
                access_token: "ntn_oauth".to_string(),
                workspace_id: Some("ws".to_string()),
                workspace_name: Some("Team".to_string()),
                bot_id: None,
            })
        }

        async fn granted_page_ids(&self, _token: &str) -> Result<Vec<String>, ApiFailure> {
            Ok(self.pages.clone())
        }
    }

    fn services(dir: &TempDir, pages: &[&str], client_id: Option<&str>) -> Services {
        let store = FileTokenStore::load(&dir.path().join("auth.json")).unwrap();
        Services {
            repo: Arc::new(store),
            workspace: Arc::new(FakeNotion {
                pages: pages.iter().map(|p| p.to_string()).collect(),
            }),
            client_id: client_id.map(str::to_string),
        }
    }

    fn start(services: &Services) -> MessageClient {
        let mut dispatcher = Dispatcher::new();
        register_handlers(&mut dispatcher, services).unwrap();
        let (queue, _runner) = dispatcher.spawn(8);
        MessageClient::new(queue)
    }

    #[test]
    fn test_every_message_is_registered_once() {
        let dir = tempfile::tempdir().unwrap();
        let services = services(&dir, &[], None);
        let mut dispatcher = Dispatcher::new();
        register_handlers(&mut dispatcher, &services).unwrap();

        let mut expected: Vec<_> = MESSAGE_NAMES.to_vec();
        expected.sort_unstable();
        assert_eq!(dispatcher.names(), expected);

        assert!(matches!(
            register_handlers(&mut dispatcher, &services),
            Err(RegistrationError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let client = start(&services(&dir, &[], None));

        assert_eq!(client.get_token().await, Ok(None));
        assert_eq!(
            client.set_token("   ").await,
            Err(CallError::Domain(SetTokenError::InvalidToken))
        );
        client.set_token("secret_pasted").await.unwrap();
        assert_eq!(client.get_token().await, Ok(Some("secret_pasted".to_string())));
        // Reads are repeatable.
        assert_eq!(client.get_token().await, Ok(Some("secret_pasted".to_string())));

        client.clear_token().await.unwrap();
        assert_eq!(client.get_token().await, Ok(None));
    }

    #[tokio::test]
    async fn test_validate_integration_token() {
        let dir = tempfile::tempdir().unwrap();
        let client = start(&services(&dir, &[], None));

        assert_eq!(client.validate_integration_token("secret_ok").await, Ok(()));
        assert_eq!(
            client.validate_integration_token("secret_nope").await,
            Err(CallError::Domain(NotionError::InvalidToken))
        );
        assert_eq!(
            client.validate_integration_token("secret_busy").await,
            Err(CallError::Domain(NotionError::RateLimit))
        );
        // Validation never stores anything.
        assert_eq!(client.get_token().await, Ok(None));
    }

    #[tokio::test]
    async fn test_client_id() {
        let dir = tempfile::tempdir().unwrap();
        let client = start(&services(&dir, &[], Some("cid-123")));
        assert_eq!(client.get_client_id().await, Ok("cid-123".to_string()));

        let client = start(&services(&dir, &[], None));
        assert_eq!(
            client.get_client_id().await,
            Err(CallError::Domain(ClientIdError::FetchingClientId))
        );
    }

    #[tokio::test]
    async fn test_connect_stores_token() {
        let dir = tempfile::tempdir().unwrap();
        let client = start(&services(&dir, &["p1"], Some("cid")));

        let response = client
            .connect("abc123", "http://127.0.0.1:8847/callback")
            .await
            .unwrap();
        assert_eq!(response.granted_page_ids, vec!["p1".to_string()]);
        assert_eq!(client.get_token().await, Ok(Some("ntn_oauth".to_string())));
    }

    #[tokio::test]
    async fn test_connect_failures() {
        let dir = tempfile::tempdir().unwrap();
        let client = start(&services(&dir, &[], Some("cid")));

        assert_eq!(
            client.connect("expired", "http://127.0.0.1:8847/callback").await,
            Err(CallError::Domain(ConnectError::Notion(NotionError::Request)))
        );
        assert_eq!(client.get_token().await, Ok(None));

        assert_eq!(
            client.connect("abc123", "http://127.0.0.1:8847/callback").await,
            Err(CallError::Domain(ConnectError::NoPagesGranted))
        );
        assert_eq!(client.get_token().await, Ok(Some("ntn_oauth".to_string())));
    }

    #[tokio::test]
    async fn test_stalled_notion_call_does_not_starve_the_queue() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _silent = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let dir = tempfile::tempdir().unwrap();
        let notion = NotionClient::with_timeouts(
            format!("http://{}/v1", addr),
            Duration::from_millis(300),
            Duration::from_millis(300),
        )
        .unwrap();
        let services = Services {
            repo: Arc::new(FileTokenStore::load(&dir.path().join("auth.json")).unwrap()),
            workspace: Arc::new(notion),
            client_id: None,
        };
        let client = start(&services);

        let validating = {
            let client = client.clone();
            tokio::spawn(async move { client.validate_integration_token("secret_x").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let token = tokio::time::timeout(Duration::from_secs(5), client.get_token())
            .await
            .expect("getToken stuck behind the Notion request");
        assert_eq!(token, Ok(None));
        assert_eq!(
            validating.await.unwrap(),
            Err(CallError::Domain(NotionError::Other))
        );
    }
}
