use crate::actor::{self, ActorClient};
use crate::api::options::StoreOptionsValidated;
use crate::api::{EventListener, StoreOptions, StoreOptionsError, StoreRole};
use crate::database::{DatabaseRegistry, Position, RetentionPolicy};
use crate::lease::{Leaser, NodeInfo};
use crate::replication::{FrameConsumer, FrameProducer, Invalidator, ReplicationConnector, RetentionMonitor, Snapshotter};
use crate::shutdown::{shutdown_signal, ShutdownHandle};
use crate::stats::StatsSource;
use crate::store::{
    ready_signal, role_channel, CommitError, CommitInput, ElectionDriver, ElectionTimings, LocalStore, ReadyListener,
    RoleChangeListener, RoleSnapshot,
};
use crate::timers::RealClock;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct StoreConfig {
    pub hostname: String,
    /// Where replicas reach this node's replication endpoint.
    pub advertise_url: String,
    /// Whether this node may become primary.
    pub candidate: bool,
    pub leaser: Arc<dyn Leaser>,
    pub connector: Arc<dyn ReplicationConnector>,
    pub invalidator: Option<Arc<dyn Invalidator>>,
    pub snapshotter: Option<Arc<dyn Snapshotter>>,
    pub options: StoreOptions,
}

/// Store is one node's view of the replicated databases. It elects (or follows) a primary in
/// the background, admits commits while primary, and applies the primary's frames otherwise.
pub struct Store {
    logger: slog::Logger,
    node: NodeInfo,
    actor: ActorClient,
    registry: Arc<DatabaseRegistry>,
    role: RoleChangeListener,
    ready: ReadyListener,
    producer: FrameProducer,
    counters: Arc<CommitCounters>,
    shutdown: Option<ShutdownHandle>,
    election_task: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct CommitCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl Store {
    /// Starts the store's background tasks. Must be called within a tokio runtime.
    pub fn open(logger: slog::Logger, config: StoreConfig) -> Result<Store, StoreOptionsError> {
        let options = StoreOptionsValidated::try_from(config.options)?;
        options.check_lease_ttl(config.leaser.ttl())?;
        let logger = logger.new(slog::o!("Node" => config.hostname.clone()));
        let node = NodeInfo::new(config.hostname, config.advertise_url);

        let registry = Arc::new(DatabaseRegistry::new());
        let (role_notifier, role) = role_channel(RoleSnapshot::Initializing);
        let (ready_notifier, ready) = ready_signal();
        let (shutdown, shutdown_signal) = shutdown_signal();

        let local_store = LocalStore::new(
            logger.clone(),
            config.leaser.clone(),
            registry.clone(),
            role_notifier,
            ready_notifier.clone(),
        );
        let (actor, store_actor) = actor::create(32, local_store);
        tokio::spawn(store_actor.run_event_loop());

        let producer = FrameProducer::new(
            logger.new(slog::o!("Component" => "producer")),
            registry.clone(),
            role.clone(),
            config.snapshotter.clone(),
            shutdown_signal.clone(),
        );
        let consumer = FrameConsumer::new(
            logger.new(slog::o!("Component" => "consumer")),
            node.hostname.clone(),
            registry.clone(),
            config.connector,
            config.invalidator,
            config.snapshotter,
            ready_notifier,
        );

        let retention = RetentionMonitor::new(
            logger.new(slog::o!("Component" => "retention")),
            registry.clone(),
            RetentionPolicy {
                duration: options.retention,
                max_frames: options.retention_frames,
            },
            options.retention_monitor_interval,
            RealClock,
        );
        tokio::spawn(retention.run(shutdown_signal.clone()));

        let driver = ElectionDriver::new(
            logger.new(slog::o!("Component" => "election")),
            node.clone(),
            config.candidate,
            config.leaser,
            actor.clone(),
            consumer,
            ElectionTimings {
                renew_interval: options.renew_interval,
                backoff_min: options.reconnect_backoff_min,
                backoff_max: options.reconnect_backoff_max,
                release_timeout: options.release_timeout,
            },
            RealClock,
            shutdown_signal,
        );
        let election_task = tokio::spawn(driver.run());

        slog::info!(logger, "Store opened (candidate: {})", config.candidate);
        Ok(Store {
            logger,
            node,
            actor,
            registry,
            role,
            ready,
            producer,
            counters: Arc::new(CommitCounters::default()),
            shutdown: Some(shutdown),
            election_task: Some(election_task),
        })
    }

    /// Commits `data` as the next frame of `database`, creating the database on first write.
    pub async fn commit(&self, database: &str, data: Bytes) -> Result<Position, CommitError> {
        let input = CommitInput {
            database: database.to_string(),
            data,
        };
        let result = self.actor.commit(input).await;

        let counter = match result {
            Ok(_) => &self.counters.accepted,
            Err(_) => &self.counters.rejected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        result
    }

    pub fn node(&self) -> &NodeInfo {
        &self.node
    }

    pub fn role(&self) -> StoreRole {
        StoreRole::from(self.role.current())
    }

    pub fn is_primary(&self) -> bool {
        self.role.is_primary()
    }

    /// Fires once this node is primary, or caught up with the primary it first followed.
    pub fn ready(&self) -> ReadyListener {
        self.ready.clone()
    }

    pub fn events(&self) -> EventListener {
        EventListener::new(self.role.clone())
    }

    pub fn position(&self, database: &str) -> Option<Position> {
        self.registry.get(database).map(|db| db.position())
    }

    pub fn databases(&self) -> Vec<String> {
        self.registry.names()
    }

    /// The serving side of replication, to be exposed by a transport.
    pub fn producer(&self) -> FrameProducer {
        self.producer.clone()
    }

    pub fn stats(&self) -> Arc<dyn StatsSource> {
        Arc::new(StoreStats {
            role: self.role.clone(),
            ready: self.ready.clone(),
            registry: self.registry.clone(),
            counters: self.counters.clone(),
        })
    }

    /// Stops every background task. A primary releases its lease on the way out.
    pub async fn close(mut self) {
        slog::info!(self.logger, "Closing store");
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.trigger();
        }
        if let Some(task) = self.election_task.take() {
            if let Err(e) = task.await {
                slog::warn!(self.logger, "Election task failed: {:?}", e);
            }
        }
    }
}

struct StoreStats {
    role: RoleChangeListener,
    ready: ReadyListener,
    registry: Arc<DatabaseRegistry>,
    counters: Arc<CommitCounters>,
}

impl StatsSource for StoreStats {
    fn stats(&self) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        let role = match self.role.current() {
            RoleSnapshot::Initializing => "initializing".to_string(),
            RoleSnapshot::Primary => "primary".to_string(),
            RoleSnapshot::Replica(primary) => format!("replica of {}", primary.hostname),
            RoleSnapshot::Disconnected => "disconnected".to_string(),
        };
        stats.insert("role".to_string(), role);
        stats.insert("ready".to_string(), self.ready.is_ready().to_string());
        stats.insert(
            "commits_accepted".to_string(),
            self.counters.accepted.load(Ordering::Relaxed).to_string(),
        );
        stats.insert(
            "commits_rejected".to_string(),
            self.counters.rejected.load(Ordering::Relaxed).to_string(),
        );
        for (name, position) in self.registry.catalog() {
            stats.insert(format!("db.{}.position", name), position.to_string());
            if let Some(db) = self.registry.get(&name) {
                stats.insert(format!("db.{}.replicas", name), db.live_sessions().len().to_string());
            }
        }

        stats
    }
}
