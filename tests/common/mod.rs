#![allow(dead_code)]

use bytes::Bytes;
use leasedb::{
    Coordinator, CoordinatorError, Invalidator, LockGrant, LockRequest, NodeInfo, Position, ReplicationClient,
    ReplicationConnector, Snapshotter, Store, StoreRole, TransportError,
};
use slog::Drain;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

pub fn create_root_logger_for_stdout(node: &str) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    slog::Logger::root(drain, slog::o!("Test" => node.to_string()))
}

/// Polls `condition` until it holds, panicking after `timeout`.
pub async fn wait_until(what: &str, timeout: Duration, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            panic!("Timed out waiting until {}", what);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_for_primary<'a>(stores: &[&'a Store], timeout: Duration) -> &'a Store {
    let deadline = Instant::now() + timeout;
    loop {
        for store in stores {
            if store.role() == StoreRole::Primary {
                return store;
            }
        }
        if Instant::now() >= deadline {
            panic!("Timed out waiting for a primary");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub async fn wait_for_position(store: &Store, database: &str, sequence: u64, timeout: Duration) {
    wait_until(&format!("{} reached {}", store.node().hostname, sequence), timeout, || {
        store.position(database).map_or(false, |p| p.sequence >= sequence)
    })
    .await;
}

/// Records every invalidation, in call order.
#[derive(Default)]
pub struct RecordingInvalidator {
    positions: Mutex<Vec<(String, Position)>>,
    databases: Mutex<Vec<String>>,
}

impl RecordingInvalidator {
    pub fn positions(&self) -> Vec<(String, Position)> {
        self.positions.lock().unwrap().clone()
    }

    pub fn databases(&self) -> Vec<String> {
        self.databases.lock().unwrap().clone()
    }
}

impl Invalidator for RecordingInvalidator {
    fn invalidate_position(&self, database: &str, position: Position) {
        self.positions.lock().unwrap().push((database.to_string(), position));
    }

    fn invalidate_database(&self, database: &str) {
        self.databases.lock().unwrap().push(database.to_string());
    }
}

/// Snapshots are a fixed image; restores are recorded.
#[derive(Default)]
pub struct RecordingSnapshotter {
    restored: Mutex<Vec<(String, Position)>>,
}

impl RecordingSnapshotter {
    pub fn restored(&self) -> Vec<(String, Position)> {
        self.restored.lock().unwrap().clone()
    }
}

impl Snapshotter for RecordingSnapshotter {
    fn snapshot(&self, database: &str) -> io::Result<Bytes> {
        Ok(Bytes::from(format!("image-of-{}", database)))
    }

    fn restore(&self, database: &str, position: Position, _image: Bytes) -> io::Result<()> {
        self.restored.lock().unwrap().push((database.to_string(), position));
        Ok(())
    }
}

/// A coordinator one node can be cut off from.
pub struct Partitionable {
    inner: Arc<dyn Coordinator>,
    partitioned: AtomicBool,
}

impl Partitionable {
    pub fn new(inner: Arc<dyn Coordinator>) -> Self {
        Partitionable {
            inner,
            partitioned: AtomicBool::new(false),
        }
    }

    pub fn set_partitioned(&self, partitioned: bool) {
        self.partitioned.store(partitioned, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CoordinatorError> {
        if self.partitioned.load(Ordering::SeqCst) {
            return Err(CoordinatorError::Unavailable("partitioned".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Coordinator for Partitionable {
    async fn lock(&self, request: LockRequest) -> Result<LockGrant, CoordinatorError> {
        self.check()?;
        self.inner.lock(request).await
    }

    async fn renew(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        self.check()?;
        self.inner.renew(key, session).await
    }

    async fn unlock(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        self.check()?;
        self.inner.unlock(key, session).await
    }

    async fn holder(&self, key: &str) -> Result<Option<NodeInfo>, CoordinatorError> {
        self.check()?;
        self.inner.holder(key).await
    }
}

/// A coordinator that can revoke the holder's session: renewals report the session invalid and
/// nobody can take the key until `restore()`.
pub struct Revocable {
    inner: Arc<dyn Coordinator>,
    revoked: AtomicBool,
}

impl Revocable {
    pub fn new(inner: Arc<dyn Coordinator>) -> Self {
        Revocable {
            inner,
            revoked: AtomicBool::new(false),
        }
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn restore(&self) {
        self.revoked.store(false, Ordering::SeqCst);
    }

    fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Coordinator for Revocable {
    async fn lock(&self, request: LockRequest) -> Result<LockGrant, CoordinatorError> {
        if self.is_revoked() {
            return Err(CoordinatorError::Held {
                holder: NodeInfo::new("operator", "local://operator"),
            });
        }
        self.inner.lock(request).await
    }

    async fn renew(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        if self.is_revoked() {
            return Err(CoordinatorError::SessionInvalid);
        }
        self.inner.renew(key, session).await
    }

    async fn unlock(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        self.inner.unlock(key, session).await
    }

    async fn holder(&self, key: &str) -> Result<Option<NodeInfo>, CoordinatorError> {
        self.inner.holder(key).await
    }
}

/// Counts the connections a replica opens.
pub struct CountingConnector {
    inner: Arc<dyn ReplicationConnector>,
    connections: AtomicUsize,
}

impl CountingConnector {
    pub fn new(inner: Arc<dyn ReplicationConnector>) -> Self {
        CountingConnector {
            inner,
            connections: AtomicUsize::new(0),
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReplicationConnector for CountingConnector {
    async fn connect(&self, advertise_url: &str) -> Result<Arc<dyn ReplicationClient>, TransportError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(advertise_url).await
    }
}
