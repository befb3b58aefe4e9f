//! Configuration schema and loading.
//!
//! Configured via a TOML file at `<data dir>/config.toml`. A missing file
//! means defaults; OAuth client credentials can also come from the
//! environment so they never have to be written to disk.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use exnota_auth_bridge::oauth::NOTION_AUTHORIZE_URL;
use exnota_auth_bridge::{
    DEFAULT_API_BASE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, NOTION_VERSION,
};

pub const CLIENT_ID_ENV: &str = "EXNOTA_NOTION_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "EXNOTA_NOTION_CLIENT_SECRET";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExnotaConfig {
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub oauth: OAuthSettings,
}

/// Notion public-integration settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
    /// Upper bound on any single Notion API call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl NotionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: default_api_base_url(),
            authorize_url: default_authorize_url(),
            notion_version: default_notion_version(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_authorize_url() -> String {
    NOTION_AUTHORIZE_URL.to_string()
}

fn default_notion_version() -> String {
    NOTION_VERSION.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Where the background keeps the token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// `auth.json` in the data directory.
    #[default]
    File,
    /// The OS credential store.
    Keyring,
}

/// UI-side OAuth settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthSettings {
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    #[serde(default = "default_authorize_timeout_secs")]
    pub authorize_timeout_secs: u64,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            callback_port: default_callback_port(),
            authorize_timeout_secs: default_authorize_timeout_secs(),
        }
    }
}

fn default_callback_port() -> u16 {
    8847
}

fn default_authorize_timeout_secs() -> u64 {
    300
}

impl ExnotaConfig {
    /// Load configuration from a TOML file, then apply environment
    /// overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(client_id) = lookup(CLIENT_ID_ENV) {
            self.notion.client_id = Some(client_id);
        }
        if let Some(client_secret) = lookup(CLIENT_SECRET_ENV) {
            self.notion.client_secret = Some(client_secret);
        }
    }

    /// The OAuth client id, if one is configured and not blank.
    pub fn client_id(&self) -> Option<&str> {
        non_blank(self.notion.client_id.as_deref())
    }

    pub fn client_secret(&self) -> Option<&str> {
        non_blank(self.notion.client_secret.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExnotaConfig::default();
        assert_eq!(config.notion.api_base_url, "https://api.notion.com/v1");
        assert_eq!(config.notion.notion_version, "2022-06-28");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.oauth.callback_port, 8847);
        assert_eq!(config.notion.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.notion.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.client_id(), None);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[notion]
client_id = "abc-123"
client_secret = "shh"

[storage]
backend = "keyring"

[oauth]
callback_port = 9000
"#;
        let config: ExnotaConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.client_id(), Some("abc-123"));
        assert_eq!(config.client_secret(), Some("shh"));
        assert_eq!(config.storage.backend, StorageBackend::Keyring);
        assert_eq!(config.oauth.callback_port, 9000);
        assert_eq!(config.oauth.authorize_timeout_secs, 300);
        assert_eq!(config.notion.authorize_url, NOTION_AUTHORIZE_URL);
    }

    #[test]
    fn test_notion_timeouts_from_toml() {
        let config: ExnotaConfig =
            toml::from_str("[notion]\nrequest_timeout_secs = 5\nconnect_timeout_secs = 0\n")
                .unwrap();
        assert_eq!(config.notion.request_timeout(), Duration::from_secs(5));
        // Zero would mean an immediate failure on every call.
        assert_eq!(config.notion.connect_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_blank_client_id_counts_as_missing() {
        let config: ExnotaConfig = toml::from_str("[notion]\nclient_id = \"   \"\n").unwrap();
        assert_eq!(config.client_id(), None);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: ExnotaConfig = toml::from_str("[notion]\nclient_id = \"from-file\"\n").unwrap();
        config.apply_overrides(|key| match key {
            CLIENT_ID_ENV => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.client_id(), Some("from-env"));
        assert_eq!(config.client_secret(), None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExnotaConfig::load_file(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.oauth.callback_port, 8847);
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[notion\n").unwrap();
        assert!(ExnotaConfig::load_file(&path).is_err());
    }
}
