use anyhow::Result;
use tracing::info;

use exnota_core::{ExnotaConfig, ExnotaPaths};
use exnota_messaging::{socket, Dispatcher};

mod background;

use background::{register_handlers, Services};

const QUEUE_DEPTH: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout stays free for whoever launched us; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let paths = ExnotaPaths::from_env();
    paths.ensure_dirs()?;
    let config = ExnotaConfig::load(&paths.config_path)?;

    let services = Services::from_config(&config, &paths)?;
    let mut dispatcher = Dispatcher::new();
    register_handlers(&mut dispatcher, &services)?;
    info!("Serving {}", dispatcher.names().join(", "));

    let (queue, _runner) = dispatcher.spawn(QUEUE_DEPTH);
    let listener = socket::bind(&paths.socket_path)?;
    socket::serve(listener, queue).await
}
