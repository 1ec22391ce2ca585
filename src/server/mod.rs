mod coordinator_server;
mod replication_server;

pub(crate) use coordinator_server::CoordinatorServer;
pub(crate) use replication_server::ReplicationServer;
