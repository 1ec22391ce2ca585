mod consumer;
mod grpc_transport;
mod hooks;
mod local_network;
mod producer;
mod protocol;
mod retention;
mod transport;
mod wire;

pub use consumer::ReplicationError;
pub use grpc_transport::GrpcConnector;
pub use hooks::Invalidator;
pub use hooks::Snapshotter;
pub use local_network::LocalNetwork;
pub use producer::FrameProducer;
pub use protocol::Acknowledgement;
pub use protocol::CatalogMessage;
pub use protocol::DatabaseInfo;
pub use protocol::StreamErrorCode;
pub use protocol::StreamMessage;
pub use protocol::StreamRequest;
pub use transport::MessageStream;
pub use transport::ReplicationClient;
pub use transport::ReplicationConnector;
pub use transport::TransportError;

pub(crate) use consumer::FrameConsumer;
pub(crate) use retention::RetentionMonitor;
pub(crate) use wire::{
    acknowledgement_from_proto, catalog_message_to_proto, stream_message_to_proto, stream_request_from_proto,
};
