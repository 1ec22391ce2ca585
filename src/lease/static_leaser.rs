use crate::lease::{Lease, LeaseError, Leaser, NodeInfo};
use chrono::Utc;
use tokio::time::{Duration, Instant};

// There is no backend to expire a static lease, the term only bounds `Instant` arithmetic.
const STATIC_TERM: Duration = Duration::from_secs(24 * 60 * 60);

/// StaticLeaser pins one node as permanent primary. Every other node is a permanent replica of
/// it. Nothing is contended, so there is no lock-delay and no backend round trip.
pub struct StaticLeaser {
    is_primary: bool,
    primary: NodeInfo,
}

impl StaticLeaser {
    /// `primary` is this node's own info when `is_primary`, otherwise the primary's.
    pub fn new(is_primary: bool, primary: NodeInfo) -> Self {
        StaticLeaser { is_primary, primary }
    }
}

#[async_trait::async_trait]
impl Leaser for StaticLeaser {
    async fn open(&self) -> Result<(), LeaseError> {
        Ok(())
    }

    async fn close(&self) {}

    fn is_primary(&self) -> bool {
        self.is_primary
    }

    fn ttl(&self) -> Option<Duration> {
        None
    }

    async fn primary(&self) -> Result<NodeInfo, LeaseError> {
        Ok(self.primary.clone())
    }

    async fn acquire(&self, candidate: &NodeInfo) -> Result<Lease, LeaseError> {
        if !self.is_primary || candidate.hostname != self.primary.hostname {
            return Err(LeaseError::LeaseHeld {
                holder: Some(self.primary.clone()),
            });
        }

        let now = Utc::now();
        Ok(Lease {
            id: 0,
            owner: self.primary.clone(),
            generation: 1,
            acquired_at: now,
            renewed_at: now,
            expires_at: Instant::now() + STATIC_TERM,
            ttl: STATIC_TERM,
            lock_delay: Duration::from_secs(0),
        })
    }

    async fn renew(&self, lease: &Lease) -> Result<Lease, LeaseError> {
        Ok(lease.renewed(Instant::now() + STATIC_TERM))
    }

    async fn release(&self, _lease: &Lease) -> Result<(), LeaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_node() -> NodeInfo {
        NodeInfo::new("node-a", "http://node-a:20202")
    }

    #[tokio::test]
    async fn configured_primary_always_acquires() {
        let leaser = StaticLeaser::new(true, primary_node());
        leaser.open().await.unwrap();

        let lease = leaser.acquire(&primary_node()).await.unwrap();
        assert!(leaser.is_primary());
        assert_eq!(lease.owner(), &primary_node());
        assert_eq!(lease.lock_delay(), Duration::from_secs(0));

        let renewed = leaser.renew(&lease).await.unwrap();
        assert_eq!(renewed.generation(), lease.generation());
        assert!(renewed.expires_at >= lease.expires_at);
    }

    #[tokio::test]
    async fn replicas_never_acquire_and_always_know_the_primary() {
        let leaser = StaticLeaser::new(false, primary_node());
        let me = NodeInfo::new("node-b", "http://node-b:20202");

        assert!(!leaser.is_primary());
        assert_eq!(
            leaser.acquire(&me).await.unwrap_err(),
            LeaseError::LeaseHeld {
                holder: Some(primary_node())
            }
        );
        assert_eq!(leaser.primary().await.unwrap(), primary_node());
    }
}
