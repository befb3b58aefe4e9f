//! Notion API client.
//!
//! Only the three calls the connect flow needs: token validation, the OAuth
//! code exchange and listing the pages shared with the integration.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Notion API version header.
pub const NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";

// API max page size for /search.
const SEARCH_PAGE_SIZE: usize = 100;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a Notion call failed, before any product-level interpretation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiFailure {
    #[error("Notion responded with HTTP {status}")]
    Status { status: u16, code: Option<String> },
    #[error("request to Notion failed: {0}")]
    Network(String),
    #[error("unexpected response from Notion: {0}")]
    Malformed(String),
    #[error("OAuth client credentials are not configured")]
    MissingCredentials,
}

impl From<reqwest::Error> for ApiFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiFailure::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ApiFailure::Status {
                status: status.as_u16(),
                code: None,
            }
        } else {
            ApiFailure::Network(err.to_string())
        }
    }
}

/// The useful part of a successful `/oauth/token` response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NotionGrant {
    pub access_token: String,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone)]
struct OAuthCredentials {
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Clone)]
pub struct NotionClient {
    http_client: Client,
    base_url: String,
    notion_version: String,
    credentials: Option<OAuthCredentials>,
}

impl NotionClient {
    /// Client with the default timeouts.
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_timeouts(base_url, DEFAULT_REQUEST_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Every call gives up after `request_timeout`, so a stalled Notion
    /// request cannot hold the background's message queue.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> reqwest::Result<Self> {
        let http_client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            notion_version: NOTION_VERSION.to_string(),
            credentials: None,
        })
    }

    pub fn with_notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = version.into();
        self
    }

    /// Client id and secret of the public integration, needed for the code
    /// exchange only.
    pub fn with_oauth_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.credentials = Some(OAuthCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        });
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Checks a token by fetching the integration's own bot user.
    pub async fn current_user(&self, token: &str) -> Result<(), ApiFailure> {
        let response = self
            .http_client
            .get(self.url("users/me"))
            .bearer_auth(token)
            .header("Notion-Version", &self.notion_version)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Exchanges a one-time authorization code for an access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<NotionGrant, ApiFailure> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ApiFailure::MissingCredentials)?;

        let response = self
            .http_client
            .post(self.url("oauth/token"))
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header("Notion-Version", &self.notion_version)
            .json(&serde_json::json!({
                "grant_type": "authorization_code",
                "code": code,
                "redirect_uri": redirect_uri,
            }))
            .send()
            .await?;

        let grant: NotionGrant = check_status(response).await?.json().await?;
        info!(
            "Exchanged OAuth code for Notion workspace {}",
            grant.workspace_name.as_deref().unwrap_or("<unnamed>")
        );
        Ok(grant)
    }

    /// Ids of every page the token can see, following pagination.
    pub async fn granted_page_ids(&self, token: &str) -> Result<Vec<String>, ApiFailure> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::json!({
                "filter": { "property": "object", "value": "page" },
                "page_size": SEARCH_PAGE_SIZE,
            });
            if let Some(cursor) = &cursor {
                body["start_cursor"] = serde_json::Value::String(cursor.clone());
            }

            let response = self
                .http_client
                .post(self.url("search"))
                .bearer_auth(token)
                .header("Notion-Version", &self.notion_version)
                .json(&body)
                .send()
                .await?;
            let page: SearchResponse = check_status(response).await?.json().await?;

            ids.extend(page.results.into_iter().map(|result| result.id));

            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Integration can see {} pages", ids.len());
        Ok(ids)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
}

async fn check_status(response: Response) -> Result<Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.code);
    warn!(
        "Notion request failed: HTTP {} ({})",
        status.as_u16(),
        code.as_deref().unwrap_or("no error code")
    );
    Err(ApiFailure::Status {
        status: status.as_u16(),
        code,
    })
}
