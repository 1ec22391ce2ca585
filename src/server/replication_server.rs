use crate::grpc::grpc_replication_server::{GrpcReplication, GrpcReplicationServer};
use crate::grpc::{ProtoAckReq, ProtoAckResult, ProtoCatalogMessage, ProtoCatalogReq, ProtoStreamMessage, ProtoStreamReq};
use crate::replication::{
    acknowledgement_from_proto, catalog_message_to_proto, stream_message_to_proto, stream_request_from_proto,
    FrameProducer,
};
use crate::shutdown::ShutdownSignal;
use std::pin::Pin;
use tokio::net::TcpListener;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tokio_stream::{Stream, StreamExt};
use tonic::transport::Server;
use tonic::{Request, Response, Status};

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + Sync + 'static>>;

/// ReplicationServer exposes a store's `FrameProducer` as the `GrpcReplication` service.
pub(crate) struct ReplicationServer {
    logger: slog::Logger,
    producer: FrameProducer,
}

impl ReplicationServer {
    pub(crate) fn new(logger: slog::Logger, producer: FrameProducer) -> Self {
        ReplicationServer { logger, producer }
    }

    pub(crate) async fn run(self, listener: TcpListener, mut shutdown_signal: ShutdownSignal) {
        let logger = self.logger.clone();
        slog::info!(logger, "Listening on '{:?}'", listener.local_addr());

        let result = Server::builder()
            .add_service(GrpcReplicationServer::new(self))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown_signal.wait().await
            })
            .await;

        slog::info!(logger, "Server run() has exited: {:?}", result);
    }
}

#[async_trait::async_trait]
impl GrpcReplication for ReplicationServer {
    type WatchCatalogStream = ResponseStream<ProtoCatalogMessage>;
    type StreamFramesStream = ResponseStream<ProtoStreamMessage>;

    async fn watch_catalog(
        &self,
        rpc_request_wrapped: Request<ProtoCatalogReq>,
    ) -> Result<Response<Self::WatchCatalogStream>, Status> {
        let rpc_request = rpc_request_wrapped.into_inner();
        let messages = self.producer.watch_catalog(rpc_request.client_hostname);

        // Dropping the stream (client hung up) closes the receiver, which ends the session.
        let stream = ReceiverStream::new(messages).map(|message| Ok(catalog_message_to_proto(message)));
        Ok(Response::new(Box::pin(stream)))
    }

    async fn stream_frames(
        &self,
        rpc_request_wrapped: Request<ProtoStreamReq>,
    ) -> Result<Response<Self::StreamFramesStream>, Status> {
        let request = stream_request_from_proto(rpc_request_wrapped.into_inner())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        slog::debug!(
            self.logger,
            "Stream request from '{}' for '{}' at {}",
            request.client_hostname,
            request.database,
            request.resume
        );
        let messages = self.producer.stream_frames(request);

        let stream = ReceiverStream::new(messages).map(|message| Ok(stream_message_to_proto(message)));
        Ok(Response::new(Box::pin(stream)))
    }

    async fn acknowledge(&self, rpc_request_wrapped: Request<ProtoAckReq>) -> Result<Response<ProtoAckResult>, Status> {
        let ack = acknowledgement_from_proto(rpc_request_wrapped.into_inner())
            .map_err(|e| Status::invalid_argument(e.to_string()))?;
        self.producer.acknowledge(ack);

        Ok(Response::new(ProtoAckResult {}))
    }
}
