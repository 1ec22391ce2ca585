mod actor;
mod api;
mod database;
mod lease;
mod replication;
mod server;
mod shutdown;
mod stats;
mod store;
mod timers;
mod grpc {
    include!("../generated/leasedb.rs");
}

pub use api::run_coordinator_server;
pub use api::try_create_node;
pub use api::ConfigError;
pub use api::CoordinatorLeaseConfig;
pub use api::CoordinatorServerHandle;
pub use api::Event;
pub use api::EventListener;
pub use api::Node;
pub use api::NodeConfig;
pub use api::NodeCreationError;
pub use api::StaticLeaseConfig;
pub use api::Store;
pub use api::StoreConfig;
pub use api::StoreOptions;
pub use api::StoreOptionsError;
pub use api::StoreRole;
pub use database::Frame;
pub use database::Position;
pub use lease::CoordinatedLeaser;
pub use lease::Coordinator;
pub use lease::CoordinatorError;
pub use lease::GrpcCoordinator;
pub use lease::Lease;
pub use lease::LeaseError;
pub use lease::Leaser;
pub use lease::LockGrant;
pub use lease::LockRequest;
pub use lease::MemoryCoordinator;
pub use lease::NodeInfo;
pub use lease::StaticLeaser;
pub use lease::DEFAULT_LEASE_KEY;
pub use lease::DEFAULT_LEASE_TTL;
pub use lease::DEFAULT_LOCK_DELAY;
pub use replication::Acknowledgement;
pub use replication::CatalogMessage;
pub use replication::DatabaseInfo;
pub use replication::FrameProducer;
pub use replication::GrpcConnector;
pub use replication::Invalidator;
pub use replication::LocalNetwork;
pub use replication::MessageStream;
pub use replication::ReplicationClient;
pub use replication::ReplicationConnector;
pub use replication::ReplicationError;
pub use replication::Snapshotter;
pub use replication::StreamErrorCode;
pub use replication::StreamMessage;
pub use replication::StreamRequest;
pub use replication::TransportError;
pub use stats::StatsError;
pub use stats::StatsRegistry;
pub use stats::StatsSource;
pub use store::CommitError;
pub use store::ReadyListener;

// `crate::{root_mod}` holds no code, just `mod` and `pub use` statements. No `mod` is `pub`;
// everything public is exported through an individual use statement.
