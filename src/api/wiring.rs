use crate::api::config::LeaseMode;
use crate::api::{ConfigError, NodeConfig, Store, StoreConfig, StoreOptionsError};
use crate::lease::{CoordinatedLeaser, Coordinator, GrpcCoordinator, Leaser, NodeInfo, StaticLeaser};
use crate::replication::GrpcConnector;
use crate::server::{CoordinatorServer, ReplicationServer};
use crate::shutdown::{shutdown_signal, ShutdownHandle};
use crate::stats::{StatsError, StatsRegistry};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum NodeCreationError {
    #[error("Invalid node config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Options(#[from] StoreOptionsError),
    #[error("Failed to bind replication server")]
    Bind(#[source] io::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Node is a store plus the gRPC server that replicates it.
pub struct Node {
    store: Store,
    stats: StatsRegistry,
    stats_name: String,
    local_addr: SocketAddr,
    server: RunningServer,
}

impl Node {
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Address the replication server actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Name the node's stats were published under.
    pub fn stats_name(&self) -> &str {
        &self.stats_name
    }

    /// Closes the store first, releasing the lease if held, then stops serving. The stats name
    /// is free for reuse afterwards.
    pub async fn close(self) {
        self.store.close().await;
        self.server.stop().await;
        self.stats.unpublish(&self.stats_name);
    }
}

pub async fn try_create_node(config: NodeConfig, stats: &StatsRegistry) -> Result<Node, NodeCreationError> {
    config.validate()?;
    let root_logger = config.info_logger.clone();
    let advertise_url = config.advertise_url();

    let (leaser, candidate) = create_leaser(&config, &root_logger)?;

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .map_err(NodeCreationError::Bind)?;
    let local_addr = listener.local_addr().map_err(NodeCreationError::Bind)?;

    let store = Store::open(
        root_logger.clone(),
        StoreConfig {
            hostname: config.hostname.clone(),
            advertise_url,
            candidate,
            leaser,
            connector: Arc::new(GrpcConnector::new(root_logger.new(slog::o!("Component" => "transport")))),
            invalidator: config.invalidator,
            snapshotter: config.snapshotter,
            options: config.options,
        },
    )?;

    if let Err(e) = stats.publish(config.hostname.clone(), store.stats()) {
        store.close().await;
        return Err(e.into());
    }

    let server = ReplicationServer::new(
        root_logger.new(slog::o!("Component" => "server")),
        store.producer(),
    );
    let (server_shutdown_handle, server_shutdown_signal) = shutdown_signal();
    let server_task = tokio::spawn(server.run(listener, server_shutdown_signal));

    Ok(Node {
        store,
        stats: stats.clone(),
        stats_name: config.hostname,
        local_addr,
        server: RunningServer {
            shutdown: server_shutdown_handle,
            task: server_task,
        },
    })
}

fn create_leaser(config: &NodeConfig, logger: &slog::Logger) -> Result<(Arc<dyn Leaser>, bool), ConfigError> {
    match config.lease_mode()? {
        LeaseMode::Coordinator(lease) => {
            let coordinator = Arc::new(GrpcCoordinator::new(
                logger.new(slog::o!("Component" => "coordinator-client")),
                lease.url.clone(),
            ));
            let leaser: Arc<dyn Leaser> = Arc::new(CoordinatedLeaser::new(
                logger.new(slog::o!("Component" => "leaser")),
                coordinator,
                lease.key.clone(),
                lease.ttl,
                lease.lock_delay,
            ));
            Ok((leaser, config.candidate))
        }
        LeaseMode::Static(lease) => {
            let primary = NodeInfo::new(lease.primary_hostname.clone(), lease.primary_advertise_url.clone());
            let leaser: Arc<dyn Leaser> = Arc::new(StaticLeaser::new(lease.primary, primary));
            // Only the pinned primary ever tries to acquire.
            Ok((leaser, lease.primary))
        }
    }
}

/// A running lease coordinator, see `run_coordinator_server()`.
pub struct CoordinatorServerHandle {
    local_addr: SocketAddr,
    server: RunningServer,
}

impl CoordinatorServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn stop(self) {
        self.server.stop().await;
    }
}

/// Hosts `coordinator` behind gRPC on `listen_addr`, for nodes configured with a
/// `CoordinatorLeaseConfig` pointing here.
pub async fn run_coordinator_server(
    logger: slog::Logger,
    listen_addr: SocketAddr,
    coordinator: Arc<dyn Coordinator>,
) -> io::Result<CoordinatorServerHandle> {
    let listener = TcpListener::bind(listen_addr).await?;
    let local_addr = listener.local_addr()?;

    let server = CoordinatorServer::new(logger, coordinator);
    let (shutdown, shutdown_signal) = shutdown_signal();
    let task = tokio::spawn(server.run(listener, shutdown_signal));

    Ok(CoordinatorServerHandle {
        local_addr,
        server: RunningServer { shutdown, task },
    })
}

struct RunningServer {
    shutdown: ShutdownHandle,
    task: JoinHandle<()>,
}

impl RunningServer {
    async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.task.await;
    }
}
