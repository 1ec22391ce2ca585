use crate::replication::{Acknowledgement, CatalogMessage, StreamMessage, StreamRequest};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Unable to reach {url}: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("Connection lost: {0}")]
    Disconnected(String),
    #[error("Malformed message: {0}")]
    Protocol(String),
}

/// An ordered stream of messages from a primary. `None` means the primary closed the stream
/// without a clean end, which replicas treat like a network failure.
pub struct MessageStream<T> {
    rx: mpsc::Receiver<Result<T, TransportError>>,
}

impl<T> MessageStream<T> {
    pub fn new(rx: mpsc::Receiver<Result<T, TransportError>>) -> Self {
        MessageStream { rx }
    }

    pub async fn next(&mut self) -> Option<Result<T, TransportError>> {
        self.rx.recv().await
    }
}

/// A connection to one primary's replication endpoint.
#[async_trait::async_trait]
pub trait ReplicationClient: Send + Sync {
    async fn watch_catalog(&self, client_hostname: String) -> Result<MessageStream<CatalogMessage>, TransportError>;

    async fn stream_frames(&self, request: StreamRequest) -> Result<MessageStream<StreamMessage>, TransportError>;

    async fn acknowledge(&self, ack: Acknowledgement) -> Result<(), TransportError>;
}

/// Resolves an advertise URL into a client.
#[async_trait::async_trait]
pub trait ReplicationConnector: Send + Sync {
    async fn connect(&self, advertise_url: &str) -> Result<Arc<dyn ReplicationClient>, TransportError>;
}
