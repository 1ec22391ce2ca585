use crate::lease::{LeaseError, NodeInfo};
use tokio::time::Duration;

#[derive(Clone, Debug)]
pub struct LockRequest {
    pub key: String,
    pub holder: NodeInfo,
    pub ttl: Duration,
    pub lock_delay: Duration,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LockGrant {
    /// Identifies this holding of the key; renew and unlock must present it.
    pub session: u64,
    /// Incremented on every successful lock of the key.
    pub generation: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Coordinator unavailable: {0}")]
    Unavailable(String),
    #[error("Key is held by {holder:?}")]
    Held { holder: NodeInfo },
    #[error("Key is in lock-delay for another {remaining:?}")]
    LockDelay { remaining: Duration },
    #[error("Session no longer holds the key")]
    SessionInvalid,
}

/// Coordinator is the slice of a consistent key/value store the coordinated leaser needs: a
/// session-scoped lock with a TTL and a lock-delay.
#[async_trait::async_trait]
pub trait Coordinator: Send + Sync {
    async fn lock(&self, request: LockRequest) -> Result<LockGrant, CoordinatorError>;

    /// Extends the holding by its TTL.
    async fn renew(&self, key: &str, session: u64) -> Result<(), CoordinatorError>;

    /// Releases the key if `session` still holds it. Not holding it is not an error.
    async fn unlock(&self, key: &str, session: u64) -> Result<(), CoordinatorError>;

    async fn holder(&self, key: &str) -> Result<Option<NodeInfo>, CoordinatorError>;
}

impl From<CoordinatorError> for LeaseError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::Unavailable(message) => LeaseError::Connection(message),
            CoordinatorError::Held { holder } => LeaseError::LeaseHeld { holder: Some(holder) },
            CoordinatorError::LockDelay { remaining } => LeaseError::LockDelay { remaining },
            CoordinatorError::SessionInvalid => LeaseError::LeaseLost,
        }
    }
}
