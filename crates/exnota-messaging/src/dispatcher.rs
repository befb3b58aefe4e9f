use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::{DispatchError, RegistrationError};
use crate::message::{Message, Request};
use crate::transport::ChannelTransport;
use crate::wire::{encode_reply, internal_fault_reply};

type BoxedHandler =
    Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, DispatchError>> + Send + Sync>;

/// A request waiting in the background queue together with its reply slot.
pub struct Envelope {
    pub request: Request,
    pub reply_to: oneshot::Sender<Result<Value, DispatchError>>,
}

/// Background-side registry: at most one handler per message name.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, BoxedHandler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler for `M`. Registering the same message twice is a
    /// startup error.
    pub fn register<M, F, Fut>(&mut self, handler: F) -> Result<(), RegistrationError>
    where
        M: Message,
        F: Fn(M::Input) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Output, M::Error>> + Send + 'static,
    {
        if self.handlers.contains_key(M::NAME) {
            return Err(RegistrationError::Duplicate(M::NAME));
        }

        let handler = Arc::new(handler);
        let boxed: BoxedHandler = Box::new(move |data: Value| {
            let handler = handler.clone();
            async move {
                let input: M::Input =
                    serde_json::from_value(data).map_err(|err| DispatchError::InvalidInput {
                        name: M::NAME,
                        reason: err.to_string(),
                    })?;

                let outcome = AssertUnwindSafe(async move { handler(input).await })
                    .catch_unwind()
                    .await;
                let reply = match outcome {
                    Ok(result) => encode_reply(&result).unwrap_or_else(|err| {
                        error!("Could not encode reply for {}: {}", M::NAME, err);
                        internal_fault_reply()
                    }),
                    Err(_) => {
                        error!("Handler for {} panicked", M::NAME);
                        internal_fault_reply()
                    }
                };
                Ok(reply)
            }
            .boxed()
        });

        self.handlers.insert(M::NAME, boxed);
        debug!("Registered handler for {}", M::NAME);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Route one request. Unknown names and undecodable input are rejected
    /// without running any handler.
    pub async fn dispatch(&self, request: Request) -> Result<Value, DispatchError> {
        let handler = self
            .handlers
            .get(request.name.as_str())
            .ok_or_else(|| DispatchError::UnknownMessage(request.name.clone()))?;
        debug!("Dispatching {}", request.name);
        handler(request.data).await
    }

    /// Serve the queue one request at a time until every sender is gone.
    pub async fn run(self, mut queue: mpsc::Receiver<Envelope>) {
        while let Some(Envelope { request, reply_to }) = queue.recv().await {
            let reply = self.dispatch(request).await;
            // The caller may have given up waiting.
            let _ = reply_to.send(reply);
        }
        info!("Background queue closed");
    }

    /// Start the run loop on the current runtime and return a handle for
    /// submitting requests to it.
    pub fn spawn(self, queue_depth: usize) -> (ChannelTransport, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(queue_depth.max(1));
        let task = tokio::spawn(self.run(rx));
        (ChannelTransport::new(tx), task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use exnota_core::result::RepositoryError;
    use serde_json::json;

    use super::*;
    use crate::catalog::{ClearToken, Empty, GetToken, TokenPayload};

    fn request(name: &str, data: Value) -> Request {
        Request::new(name, data)
    }

    #[tokio::test]
    async fn test_dispatch_encodes_success_and_failure() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<GetToken, _, _>(|_| async {
                Ok(TokenPayload {
                    token: Some("secret_abc".to_string()),
                })
            })
            .unwrap();
        dispatcher
            .register::<ClearToken, _, _>(|_| async { Err::<Empty, _>(RepositoryError::StorageError) })
            .unwrap();

        let reply = dispatcher
            .dispatch(request("notion.getToken", json!({})))
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "success", "token": "secret_abc"}));

        let reply = dispatcher
            .dispatch(request("notion.clearToken", json!({})))
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "storage-error"}));
    }

    #[tokio::test]
    async fn test_unknown_message_is_rejected() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .dispatch(request("notion.getToken", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownMessage("notion.getToken".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<crate::catalog::SetToken, _, _>(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Ok(Empty {}) }
            })
            .unwrap();

        let err = dispatcher
            .dispatch(request("notion.setToken", json!({"tok": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidInput { name: "notion.setToken", .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<GetToken, _, _>(|_| async { Ok(TokenPayload::default()) })
            .unwrap();
        let err = dispatcher
            .register::<GetToken, _, _>(|_| async { Ok(TokenPayload::default()) })
            .unwrap_err();
        assert_eq!(err, RegistrationError::Duplicate("notion.getToken"));
        assert_eq!(dispatcher.names(), vec!["notion.getToken"]);
    }

    #[tokio::test]
    async fn test_panicking_handler_replies_unknown_error() {
        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<GetToken, _, _>(|_| async {
                if true {
                    panic!("boom");
                }
                Ok(TokenPayload::default())
            })
            .unwrap();

        let reply = dispatcher
            .dispatch(request("notion.getToken", json!({})))
            .await
            .unwrap();
        assert_eq!(reply, json!({"status": "unknown-error"}));
    }

    #[tokio::test]
    async fn test_run_loop_serves_one_request_at_a_time() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (active_h, peak_h) = (active.clone(), peak.clone());

        let mut dispatcher = Dispatcher::new();
        dispatcher
            .register::<GetToken, _, _>(move |_| {
                let active = active_h.clone();
                let peak = peak_h.clone();
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(TokenPayload::default())
                }
            })
            .unwrap();

        let (transport, _task) = dispatcher.spawn(8);
        let calls = (0..4).map(|_| {
            let transport = transport.clone();
            async move { transport.submit(request("notion.getToken", json!({}))).await }
        });
        for reply in futures::future::join_all(calls).await {
            assert!(reply.is_ok());
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }
}
