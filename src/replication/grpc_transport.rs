use crate::grpc::grpc_replication_client::GrpcReplicationClient;
use crate::grpc::ProtoCatalogReq;
use crate::replication::wire;
use crate::replication::{
    Acknowledgement, CatalogMessage, MessageStream, ReplicationClient, ReplicationConnector, StreamMessage, StreamRequest,
    TransportError,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tonic::transport::Channel;
use tonic::Streaming;

/// GrpcConnector reaches primaries over the `GrpcReplication` service.
pub struct GrpcConnector {
    logger: slog::Logger,
}

impl GrpcConnector {
    pub fn new(logger: slog::Logger) -> Self {
        GrpcConnector { logger }
    }
}

#[async_trait::async_trait]
impl ReplicationConnector for GrpcConnector {
    async fn connect(&self, advertise_url: &str) -> Result<Arc<dyn ReplicationClient>, TransportError> {
        slog::debug!(self.logger, "Connecting to {}", advertise_url);
        let client = GrpcReplicationClient::connect(advertise_url.to_string())
            .await
            .map_err(|e| TransportError::Unreachable {
                url: advertise_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Arc::new(GrpcClient {
            logger: self.logger.new(slog::o!("Primary" => advertise_url.to_string())),
            client,
        }))
    }
}

struct GrpcClient {
    logger: slog::Logger,
    client: GrpcReplicationClient<Channel>,
}

#[async_trait::async_trait]
impl ReplicationClient for GrpcClient {
    async fn watch_catalog(&self, client_hostname: String) -> Result<MessageStream<CatalogMessage>, TransportError> {
        let streaming = self
            .client
            .clone()
            .watch_catalog(ProtoCatalogReq { client_hostname })
            .await
            .map_err(|status| TransportError::Disconnected(status.message().to_string()))?
            .into_inner();

        Ok(pump(self.logger.clone(), streaming, wire::catalog_message_from_proto))
    }

    async fn stream_frames(&self, request: StreamRequest) -> Result<MessageStream<StreamMessage>, TransportError> {
        let streaming = self
            .client
            .clone()
            .stream_frames(wire::stream_request_to_proto(request))
            .await
            .map_err(|status| TransportError::Disconnected(status.message().to_string()))?
            .into_inner();

        Ok(pump(self.logger.clone(), streaming, wire::stream_message_from_proto))
    }

    async fn acknowledge(&self, ack: Acknowledgement) -> Result<(), TransportError> {
        self.client
            .clone()
            .acknowledge(wire::acknowledgement_to_proto(ack))
            .await
            .map_err(|status| TransportError::Disconnected(status.message().to_string()))?;
        Ok(())
    }
}

/// Decodes a gRPC response stream on its own task. The stream ends after the first error.
fn pump<P, T, F>(logger: slog::Logger, mut streaming: Streaming<P>, convert: F) -> MessageStream<T>
where
    P: Send + 'static,
    T: Send + 'static,
    F: Fn(P) -> Result<T, TransportError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                message = streaming.message() => match message {
                    Ok(Some(proto)) => convert(proto),
                    Ok(None) => return,
                    Err(status) => {
                        slog::debug!(logger, "Stream broke: {:?}", status);
                        Err(TransportError::Disconnected(status.message().to_string()))
                    }
                },
                _ = tx.closed() => return,
            };

            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                return;
            }
        }
    });

    MessageStream::new(rx)
}
