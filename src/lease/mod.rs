mod coordinated;
mod coordinator;
mod grpc_coordinator;
mod lease;
mod memory_coordinator;
mod static_leaser;

pub use coordinated::CoordinatedLeaser;
pub use coordinated::DEFAULT_LEASE_KEY;
pub use coordinated::DEFAULT_LEASE_TTL;
pub use coordinated::DEFAULT_LOCK_DELAY;
pub use coordinator::Coordinator;
pub use coordinator::CoordinatorError;
pub use coordinator::LockGrant;
pub use coordinator::LockRequest;
pub use grpc_coordinator::GrpcCoordinator;
pub use lease::Lease;
pub use lease::LeaseError;
pub use lease::Leaser;
pub use lease::NodeInfo;
pub use memory_coordinator::MemoryCoordinator;
pub use static_leaser::StaticLeaser;

pub(crate) use grpc_coordinator::convert_node_info;
