//! Credential storage, the Notion HTTP client and OAuth helpers.
//!
//! Everything here is owned by the background process. The UI process only
//! uses [`oauth`] to build the authorize URL and read the redirect.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub mod notion;
pub mod oauth;

pub use notion::{
    ApiFailure, NotionClient, NotionGrant, DEFAULT_API_BASE, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_REQUEST_TIMEOUT, NOTION_VERSION,
};
pub use oauth::{authorize_url, loopback_redirect_url, parse_redirect, AuthorizeRequest, OAuthError, RedirectOutcome};

/// A Notion access token plus whatever the OAuth grant told us about it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl StoredToken {
    /// A bare token, e.g. an internal integration secret pasted by the user.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            workspace_id: None,
            workspace_name: None,
            bot_id: None,
            updated_at: Utc::now(),
        }
    }
}

impl From<NotionGrant> for StoredToken {
    fn from(grant: NotionGrant) -> Self {
        Self {
            access_token: grant.access_token,
            workspace_id: grant.workspace_id,
            workspace_name: grant.workspace_name,
            bot_id: grant.bot_id,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("keyring: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("could not encode token: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk layout of `auth.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notion: Option<StoredToken>,
}

/// Token store backed by a JSON file in the data directory.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Open the store, creating the parent directory if needed. The file
    /// itself is only created on the first write.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<Option<StoredToken>, StoreError> {
        let file = self.read()?;
        Ok(file.notion.filter(|token| {
            if token.access_token.is_empty() {
                warn!("Ignoring empty token in {}", self.path.display());
                return false;
            }
            true
        }))
    }

    pub fn set(&self, token: StoredToken) -> Result<(), StoreError> {
        let mut file = self.read()?;
        file.notion = Some(token);
        self.write(&file)?;
        info!("Saved Notion token to {}", self.path.display());
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let mut file = self.read()?;
        if file.notion.take().is_none() {
            debug!("No Notion token to clear");
            return Ok(());
        }
        self.write(&file)?;
        info!("Cleared Notion token from {}", self.path.display());
        Ok(())
    }

    fn read(&self) -> Result<CredentialFile, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CredentialFile::default());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(CredentialFile::default());
        }
        serde_json::from_str(&contents).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    // Write to a sibling file and rename so a crash never leaves half a file.
    fn write(&self, file: &CredentialFile) -> Result<(), StoreError> {
        let payload = serde_json::to_vec_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, payload).map_err(io_err)?;
        restrict_permissions(&tmp).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Token store backed by the OS credential store.
///
/// The whole [`StoredToken`] is kept as a JSON string under one account so
/// workspace metadata survives alongside the secret.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service: String,
    account: String,
}

impl KeyringTokenStore {
    const SERVICE: &'static str = "exnota";
    const ACCOUNT: &'static str = "notion_token";

    pub fn new() -> Self {
        Self {
            service: Self::SERVICE.to_string(),
            account: Self::ACCOUNT.to_string(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        Ok(keyring::Entry::new(&self.service, &self.account)?)
    }

    pub fn get(&self) -> Result<Option<StoredToken>, StoreError> {
        let secret = match self.entry()?.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if secret.is_empty() {
            return Ok(None);
        }
        // Older entries may hold the raw token instead of the JSON record.
        match serde_json::from_str::<StoredToken>(&secret) {
            Ok(token) => Ok(Some(token)),
            Err(_) => Ok(Some(StoredToken::new(secret))),
        }
    }

    pub fn set(&self, token: StoredToken) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&token)?;
        self.entry()?.set_password(&payload)?;
        info!("Saved Notion token to keyring account {}", self.account);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}
