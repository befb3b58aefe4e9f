use std::time::{Duration, Instant};

use async_trait::async_trait;
use tiny_http::{Header, Response, Server};
use tracing::{debug, info};

/// Opens an authorization page and waits for the provider's redirect.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Resolve with the full URL the provider redirected to.
    async fn launch(&self, url: &str) -> Result<String, AuthorizeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AuthorizeError {
    #[error("authorization window was closed")]
    Closed,
    #[error("no redirect within {0}s")]
    TimedOut(u64),
    #[error("could not open the browser: {0}")]
    Browser(String),
    #[error("callback listener failed: {0}")]
    Listener(String),
}

const CALLBACK_PATH: &str = "/callback";

const DONE_PAGE: &str = "<html><body><h1>Done</h1>\
<p>You can close this tab and return to the terminal.</p></body></html>";

/// Opens the system browser and listens on `127.0.0.1:<port>` for the
/// redirect.
pub struct LoopbackAuthorizer {
    port: u16,
    timeout: Duration,
}

impl LoopbackAuthorizer {
    pub fn new(port: u16, timeout: Duration) -> Self {
        Self { port, timeout }
    }
}

#[async_trait]
impl Authorizer for LoopbackAuthorizer {
    async fn launch(&self, url: &str) -> Result<String, AuthorizeError> {
        // Listen before the browser can possibly redirect.
        let server = Server::http(("127.0.0.1", self.port))
            .map_err(|e| AuthorizeError::Listener(e.to_string()))?;

        info!("Opening browser for Notion authorization");
        open::that(url).map_err(|e| AuthorizeError::Browser(e.to_string()))?;

        let origin = format!("http://127.0.0.1:{}", self.port);
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || wait_for_callback(&server, &origin, timeout))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    AuthorizeError::Closed
                } else {
                    AuthorizeError::Listener(e.to_string())
                }
            })?
    }
}

/// Serve requests until one hits the callback path, answering everything
/// else with 404.
fn wait_for_callback(
    server: &Server,
    origin: &str,
    timeout: Duration,
) -> Result<String, AuthorizeError> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AuthorizeError::TimedOut(timeout.as_secs()));
        }

        let request = match server.recv_timeout(remaining) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => return Err(AuthorizeError::Listener(e.to_string())),
        };

        let path = request.url().to_string();
        if !is_callback(&path) {
            debug!("Ignoring request for {}", path);
            let _ = request.respond(Response::empty(404));
            continue;
        }

        let mut response = Response::from_string(DONE_PAGE);
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
        {
            response = response.with_header(header);
        }
        let _ = request.respond(response);
        return Ok(format!("{}{}", origin, path));
    }
}

fn is_callback(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    path == CALLBACK_PATH
}
