//! Line-delimited JSON over a Unix socket, for a UI that lives in another
//! process than the background.
//!
//! Request:  `{"id": "...", "name": "notion.getToken", "data": {...}}`
//! Response: `{"id": "...", "ok": true, "reply": {"status": "success", ...}}`
//!       or: `{"id": "...", "ok": false, "error": "no handler registered for ..."}`
//!
//! `ok: false` means the request never reached a handler; domain failures
//! travel inside `reply`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::message::Request;
use crate::transport::{ChannelTransport, Transport};

#[derive(Debug, Serialize, Deserialize)]
pub struct SocketRequest {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SocketResponse {
    pub id: Option<String>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SocketResponse {
    fn reply(id: Option<String>, reply: Value) -> Self {
        Self {
            id,
            ok: true,
            reply: Some(reply),
            error: None,
        }
    }

    fn rejected(id: Option<String>, error: String) -> Self {
        Self {
            id,
            ok: false,
            reply: None,
            error: Some(error),
        }
    }
}

/// Bind the background socket, replacing a stale one left by a previous run.
pub fn bind(path: &Path) -> Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
    }
    let listener = UnixListener::bind(path)
        .with_context(|| format!("failed to bind {}", path.display()))?;
    info!("Background listening on {}", path.display());
    Ok(listener)
}

/// Accept clients forever, forwarding each request into the background queue.
pub async fn serve(listener: UnixListener, background: ChannelTransport) -> Result<()> {
    let mut failures = 0u32;
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                failures = 0;
                let background = background.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_client(stream, background).await {
                        error!("Client error: {}", err);
                    }
                });
            }
            Err(err) => {
                failures = failures.saturating_add(1);
                let delay = accept_backoff(failures);
                error!("Accept error: {} (retrying in {:?})", err, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

const ACCEPT_BACKOFF_BASE: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(2);

/// Pause after the `failures`-th accept error in a row. Errors like EMFILE
/// persist, so retrying at once would spin.
fn accept_backoff(failures: u32) -> Duration {
    let factor = 1u32 << failures.saturating_sub(1).min(10);
    ACCEPT_BACKOFF_BASE
        .saturating_mul(factor)
        .min(ACCEPT_BACKOFF_MAX)
}

async fn handle_client(stream: UnixStream, background: ChannelTransport) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<SocketRequest>(trimmed) {
            Ok(request) => {
                debug!("Received {} (id={:?})", request.name, request.id);
                let id = request.id;
                match background
                    .submit(Request::new(request.name, request.data))
                    .await
                {
                    Ok(reply) => SocketResponse::reply(id, reply),
                    Err(err) => {
                        warn!("Request rejected: {}", err);
                        SocketResponse::rejected(id, err.to_string())
                    }
                }
            }
            Err(err) => SocketResponse::rejected(None, format!("invalid request: {}", err)),
        };
        let payload = serde_json::to_string(&response)?;
        writer.write_all(payload.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    Ok(())
}

/// UI-side transport: one connection per request.
pub struct SocketTransport {
    socket_path: PathBuf,
    timeout: Duration,
    next_id: AtomicU64,
}

impl SocketTransport {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: Duration::from_secs(30),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub fn is_background_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn exchange(&self, request: Request) -> Result<Value, TransportError> {
        let mut stream = UnixStream::connect(&self.socket_path).await.map_err(|err| {
            TransportError::Unreachable(format!("{}: {}", self.socket_path.display(), err))
        })?;

        let id = format!("req_{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let frame = SocketRequest {
            id: Some(id.clone()),
            name: request.name,
            data: request.data,
        };
        let payload =
            serde_json::to_string(&frame).map_err(|err| TransportError::Codec(err.to_string()))?;
        stream
            .write_all(payload.as_bytes())
            .await
            .map_err(|_| TransportError::Closed)?;
        stream.write_all(b"\n").await.map_err(|_| TransportError::Closed)?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        let read = reader
            .read_line(&mut line)
            .await
            .map_err(|_| TransportError::Closed)?;
        if read == 0 {
            return Err(TransportError::Closed);
        }

        let response: SocketResponse = serde_json::from_str(&line)
            .map_err(|err| TransportError::Codec(err.to_string()))?;
        if response.id.as_deref() != Some(id.as_str()) {
            return Err(TransportError::Codec(format!(
                "reply id {:?} does not match {}",
                response.id, id
            )));
        }
        if !response.ok {
            return Err(TransportError::Rejected(
                response.error.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        response
            .reply
            .ok_or_else(|| TransportError::Codec("response has no reply".to_string()))
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Unreachable(format!(
                "no reply within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}
