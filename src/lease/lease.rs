use chrono::{DateTime, Utc};
use std::fmt;
use tokio::time::{Duration, Instant};

/// Identity of a node and where its replication endpoint can be reached.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct NodeInfo {
    pub hostname: String,
    pub advertise_url: String,
}

impl NodeInfo {
    pub fn new(hostname: impl Into<String>, advertise_url: impl Into<String>) -> Self {
        NodeInfo {
            hostname: hostname.into(),
            advertise_url: advertise_url.into(),
        }
    }
}

impl fmt::Debug for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.hostname, self.advertise_url)
    }
}

/// Lease is the time-bounded, exclusive right to act as primary.
#[derive(Clone, Debug)]
pub struct Lease {
    pub(crate) id: u64,
    pub(crate) owner: NodeInfo,
    pub(crate) generation: u64,
    pub(crate) acquired_at: DateTime<Utc>,
    pub(crate) renewed_at: DateTime<Utc>,
    pub(crate) expires_at: Instant,
    pub(crate) ttl: Duration,
    pub(crate) lock_delay: Duration,
}

impl Lease {
    pub fn owner(&self) -> &NodeInfo {
        &self.owner
    }

    /// Fencing counter; strictly greater for every new acquisition of the same key.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn renewed_at(&self) -> DateTime<Utc> {
        self.renewed_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn lock_delay(&self) -> Duration {
        self.lock_delay
    }

    pub(crate) fn renewed(&self, expires_at: Instant) -> Lease {
        Lease {
            renewed_at: Utc::now(),
            expires_at,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum LeaseError {
    #[error("Lease backend is unreachable: {0}")]
    Connection(String),
    #[error("Lease is held by another node: {holder:?}")]
    LeaseHeld { holder: Option<NodeInfo> },
    #[error("Lease is in its lock-delay window for another {remaining:?}")]
    LockDelay { remaining: Duration },
    #[error("Lease is no longer held")]
    LeaseLost,
    #[error("No primary is currently known")]
    NoPrimary,
    #[error("Leaser is closed")]
    Closed,
}

/// Leaser is the narrow capability the election loop uses to become, stay, or stop being the
/// primary. It never has to know which backend sits behind it.
#[async_trait::async_trait]
pub trait Leaser: Send + Sync {
    /// Establish connectivity with the backend.
    async fn open(&self) -> Result<(), LeaseError>;

    async fn close(&self);

    /// Whether this node currently holds a lease it has not locally seen expire.
    fn is_primary(&self) -> bool;

    /// How long a lease outlives its last renewal. `None` when leases never expire.
    fn ttl(&self) -> Option<Duration>;

    /// The node currently holding the lease.
    async fn primary(&self) -> Result<NodeInfo, LeaseError>;

    async fn acquire(&self, candidate: &NodeInfo) -> Result<Lease, LeaseError>;

    async fn renew(&self, lease: &Lease) -> Result<Lease, LeaseError>;

    /// Best effort. Callers never block shutdown on this.
    async fn release(&self, lease: &Lease) -> Result<(), LeaseError>;
}
