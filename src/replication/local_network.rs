use crate::replication::{
    Acknowledgement, CatalogMessage, FrameProducer, MessageStream, ReplicationClient, ReplicationConnector,
    StreamMessage, StreamRequest, TransportError,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};

/// LocalNetwork connects stores living in the same process, keyed by advertise URL. Useful
/// for embedding a whole cluster in tests.
#[derive(Clone, Default)]
pub struct LocalNetwork {
    endpoints: Arc<Mutex<HashMap<String, Endpoint>>>,
}

#[derive(Clone)]
struct Endpoint {
    producer: FrameProducer,
    // Bumped by `sever()`; every open stream to the endpoint watches it.
    severed: Arc<watch::Sender<u64>>,
}

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, advertise_url: impl Into<String>, producer: FrameProducer) {
        let (severed, _) = watch::channel(0);
        self.lock().insert(
            advertise_url.into(),
            Endpoint {
                producer,
                severed: Arc::new(severed),
            },
        );
    }

    /// New connections to `advertise_url` fail from now on. Open streams are unaffected.
    pub fn unregister(&self, advertise_url: &str) {
        self.lock().remove(advertise_url);
    }

    /// Breaks every stream currently open to `advertise_url`, as a dropped connection would.
    /// New connections still succeed.
    pub fn sever(&self, advertise_url: &str) {
        if let Some(endpoint) = self.lock().get(advertise_url) {
            let next = *endpoint.severed.borrow() + 1;
            // Fails only when no stream is open, which leaves nothing to break.
            let _ = endpoint.severed.send(next);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Endpoint>> {
        self.endpoints.lock().expect("LocalNetwork mutex guard poison")
    }
}

#[async_trait::async_trait]
impl ReplicationConnector for LocalNetwork {
    async fn connect(&self, advertise_url: &str) -> Result<Arc<dyn ReplicationClient>, TransportError> {
        match self.lock().get(advertise_url) {
            Some(endpoint) => Ok(Arc::new(LocalClient {
                endpoint: endpoint.clone(),
            })),
            None => Err(TransportError::Unreachable {
                url: advertise_url.to_string(),
                reason: "nothing registered at this address".to_string(),
            }),
        }
    }
}

struct LocalClient {
    endpoint: Endpoint,
}

#[async_trait::async_trait]
impl ReplicationClient for LocalClient {
    async fn watch_catalog(&self, client_hostname: String) -> Result<MessageStream<CatalogMessage>, TransportError> {
        let messages = self.endpoint.producer.watch_catalog(client_hostname);
        Ok(forward(messages, self.endpoint.severed.subscribe()))
    }

    async fn stream_frames(&self, request: StreamRequest) -> Result<MessageStream<StreamMessage>, TransportError> {
        let messages = self.endpoint.producer.stream_frames(request);
        Ok(forward(messages, self.endpoint.severed.subscribe()))
    }

    async fn acknowledge(&self, ack: Acknowledgement) -> Result<(), TransportError> {
        self.endpoint.producer.acknowledge(ack);
        Ok(())
    }
}

fn forward<T: Send + 'static>(mut rx: mpsc::Receiver<T>, mut severed: watch::Receiver<u64>) -> MessageStream<T> {
    let (tx, stream_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => {
                        if tx.send(Ok(message)).await.is_err() {
                            return;
                        }
                    }
                    None => return,
                },
                // Replica went away, let the producer session notice.
                _ = tx.closed() => return,
                // Both ends are dropped here, each side sees a broken connection.
                _ = severed.changed() => return,
            }
        }
    });

    MessageStream::new(stream_rx)
}
