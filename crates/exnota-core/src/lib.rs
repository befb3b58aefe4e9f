use std::path::PathBuf;

use anyhow::Result;

pub mod config;
pub mod repository;
pub mod result;
pub mod usecase;
pub mod workspace;

pub use config::{ExnotaConfig, StorageBackend};
pub use repository::{open_repository, TokenRepository};
pub use result::{
    ClientIdError, ConnectError, ErrorTag, NotionError, RepositoryError, SetTokenError,
    MESSAGING_ERROR, SUCCESS, UNKNOWN_ERROR,
};
pub use usecase::{
    ClearTokenInteractor, ClientIdInteractor, ConnectInteractor, ConnectResponse,
    GetTokenInteractor, SetTokenInteractor, ValidateTokenInteractor,
};
pub use workspace::{classify_status, WorkspaceClient};

pub use exnota_auth_bridge::{NotionClient, StoredToken};

/// Locations shared by the background and the UI process. Both must
/// resolve the same directory, so both go through [`ExnotaPaths::from_env`].
#[derive(Debug, Clone)]
pub struct ExnotaPaths {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub auth_path: PathBuf,
    pub socket_path: PathBuf, // background.sock - UI -> background messages
}

impl ExnotaPaths {
    pub fn from_env() -> Self {
        if let Some(dir) = std::env::var_os("EXNOTA_DATA_DIR") {
            return Self::from_base(PathBuf::from(dir));
        }
        if let Some(dirs) = directories::ProjectDirs::from("app", "exnota", "exnota") {
            return Self::from_base(dirs.data_dir().to_path_buf());
        }
        Self::from_base(PathBuf::from(".exnota"))
    }

    pub fn from_base(base_dir: PathBuf) -> Self {
        let config_path = base_dir.join("config.toml");
        let auth_path = base_dir.join("auth.json");
        let socket_path = base_dir.join("background.sock");
        Self {
            base_dir,
            config_path,
            auth_path,
            socket_path,
        }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}
