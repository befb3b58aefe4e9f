use anyhow::{anyhow, Result};

use exnota_core::{ExnotaConfig, ExnotaPaths};
use exnota_messaging::socket::SocketTransport;
use exnota_messaging::MessageClient;

/// Everything a command needs to talk to the background.
pub struct Session {
    pub config: ExnotaConfig,
    pub client: MessageClient,
}

impl Session {
    /// Resolve the same data directory as the background and connect to its
    /// socket.
    pub fn open() -> Result<Self> {
        let paths = ExnotaPaths::from_env();
        let config = ExnotaConfig::load(&paths.config_path)?;

        let transport = SocketTransport::new(&paths.socket_path);
        if !transport.is_background_running() {
            return Err(anyhow!(
                "Exnota background is not running (no socket at {}). Start it with `exnota-background`.",
                paths.socket_path.display()
            ));
        }

        Ok(Self {
            config,
            client: MessageClient::new(transport),
        })
    }
}
