use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::dispatcher::Envelope;
use crate::error::TransportError;
use crate::message::Request;

/// Carries a request to the background and brings back its raw reply.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Value, TransportError>;
}

/// In-process transport into a running [`Dispatcher`](crate::Dispatcher)
/// queue.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: mpsc::Sender<Envelope>,
}

impl ChannelTransport {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    pub async fn submit(&self, request: Request) -> Result<Value, TransportError> {
        let (reply_to, reply) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply_to })
            .await
            .map_err(|_| TransportError::Closed)?;
        match reply.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(rejection)) => Err(TransportError::Rejected(rejection.to_string())),
            Err(_) => Err(TransportError::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, request: Request) -> Result<Value, TransportError> {
        self.submit(request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_closed_queue_reports_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let transport = ChannelTransport::new(tx);
        assert!(transport.is_closed());
        assert_eq!(
            transport.send(Request::new("notion.getToken", json!({}))).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn test_dropped_reply_slot_reports_closed() {
        let (tx, mut rx) = mpsc::channel::<Envelope>(1);
        tokio::spawn(async move {
            // Receive and drop without answering.
            let _ = rx.recv().await;
        });
        let transport = ChannelTransport::new(tx);
        assert_eq!(
            transport.submit(Request::new("notion.getToken", json!({}))).await,
            Err(TransportError::Closed)
        );
    }
}
