use crate::lease::{Coordinator, CoordinatorError, Lease, LeaseError, Leaser, LockRequest, NodeInfo};
use crate::timers::{Clock, RealClock};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, Instant};

pub const DEFAULT_LEASE_KEY: &str = "leasedb/primary";
pub const DEFAULT_LEASE_TTL: Duration = Duration::from_secs(10);
pub const DEFAULT_LOCK_DELAY: Duration = Duration::from_secs(5);

/// CoordinatedLeaser contends for a key on a shared coordination backend.
///
/// Besides what the backend reports, it tracks the lease deadline locally. The deadline is
/// computed from a timestamp taken *before* each lock/renew call, so it never outlives the
/// backend's own expiry. Once it passes, `is_primary()` turns false even if the backend has
/// been unreachable the whole time.
pub struct CoordinatedLeaser<C: Clock = RealClock> {
    logger: slog::Logger,
    coordinator: Arc<dyn Coordinator>,
    key: String,
    ttl: Duration,
    lock_delay: Duration,
    clock: C,
    held: Mutex<Option<HeldLease>>,
    closed: AtomicBool,
}

#[derive(Copy, Clone)]
struct HeldLease {
    session: u64,
    deadline: Instant,
}

impl CoordinatedLeaser {
    pub fn new(
        logger: slog::Logger,
        coordinator: Arc<dyn Coordinator>,
        key: impl Into<String>,
        ttl: Duration,
        lock_delay: Duration,
    ) -> Self {
        Self::with_clock(logger, coordinator, key, ttl, lock_delay, RealClock)
    }
}

impl<C: Clock> CoordinatedLeaser<C> {
    pub(crate) fn with_clock(
        logger: slog::Logger,
        coordinator: Arc<dyn Coordinator>,
        key: impl Into<String>,
        ttl: Duration,
        lock_delay: Duration,
        clock: C,
    ) -> Self {
        let key = key.into();
        CoordinatedLeaser {
            logger: logger.new(slog::o!("LeaseKey" => key.clone())),
            coordinator,
            key,
            ttl,
            lock_delay,
            clock,
            held: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    fn held(&self) -> Option<HeldLease> {
        *self.held.lock().expect("CoordinatedLeaser mutex guard poison")
    }

    fn set_held(&self, held: Option<HeldLease>) {
        *self.held.lock().expect("CoordinatedLeaser mutex guard poison") = held;
    }

    fn check_open(&self) -> Result<(), LeaseError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LeaseError::Closed);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<C: Clock> Leaser for CoordinatedLeaser<C> {
    async fn open(&self) -> Result<(), LeaseError> {
        self.coordinator.holder(&self.key).await?;
        self.closed.store(false, Ordering::Release);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.set_held(None);
    }

    fn is_primary(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        match self.held() {
            Some(held) => self.clock.now() < held.deadline,
            None => false,
        }
    }

    fn ttl(&self) -> Option<Duration> {
        Some(self.ttl)
    }

    async fn primary(&self) -> Result<NodeInfo, LeaseError> {
        self.check_open()?;
        match self.coordinator.holder(&self.key).await? {
            Some(holder) => Ok(holder),
            None => Err(LeaseError::NoPrimary),
        }
    }

    async fn acquire(&self, candidate: &NodeInfo) -> Result<Lease, LeaseError> {
        self.check_open()?;
        let deadline = self.clock.now() + self.ttl;
        let grant = self
            .coordinator
            .lock(LockRequest {
                key: self.key.clone(),
                holder: candidate.clone(),
                ttl: self.ttl,
                lock_delay: self.lock_delay,
            })
            .await?;

        self.set_held(Some(HeldLease {
            session: grant.session,
            deadline,
        }));
        slog::debug!(self.logger, "Locked key, session {} generation {}", grant.session, grant.generation);

        let now = Utc::now();
        Ok(Lease {
            id: grant.session,
            owner: candidate.clone(),
            generation: grant.generation,
            acquired_at: now,
            renewed_at: now,
            expires_at: deadline,
            ttl: self.ttl,
            lock_delay: self.lock_delay,
        })
    }

    async fn renew(&self, lease: &Lease) -> Result<Lease, LeaseError> {
        self.check_open()?;
        match self.held() {
            Some(held) if held.session == lease.id => {}
            _ => return Err(LeaseError::LeaseLost),
        }

        let deadline = self.clock.now() + self.ttl;
        match self.coordinator.renew(&self.key, lease.id).await {
            Ok(()) => {
                self.set_held(Some(HeldLease {
                    session: lease.id,
                    deadline,
                }));
                Ok(lease.renewed(deadline))
            }
            Err(CoordinatorError::SessionInvalid) => {
                self.set_held(None);
                Err(LeaseError::LeaseLost)
            }
            // Keep what we hold. The local deadline decides when we stop claiming it.
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self, lease: &Lease) -> Result<(), LeaseError> {
        // Stop claiming the lease before the backend hears about it.
        self.set_held(None);
        self.coordinator.unlock(&self.key, lease.id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lease::MemoryCoordinator;
    use crate::timers::{self, MockClock, MockClockController};

    const TTL: Duration = Duration::from_secs(10);
    const LOCK_DELAY: Duration = Duration::from_secs(5);

    fn test_logger() -> slog::Logger {
        slog::Logger::root(slog::Discard, slog::o!())
    }

    fn node(name: &str) -> NodeInfo {
        NodeInfo::new(name, format!("http://{}:20202", name))
    }

    /// Wraps a coordinator so a test can cut this node off from it.
    struct Partitionable {
        inner: Arc<dyn Coordinator>,
        partitioned: AtomicBool,
    }

    impl Partitionable {
        fn check(&self) -> Result<(), CoordinatorError> {
            if self.partitioned.load(Ordering::SeqCst) {
                return Err(CoordinatorError::Unavailable("partitioned".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl Coordinator for Partitionable {
        async fn lock(&self, request: LockRequest) -> Result<crate::lease::LockGrant, CoordinatorError> {
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

    struct Cluster {
        controller: MockClockController,
        backend: Arc<MemoryCoordinator<MockClock>>,
        clock: MockClock,
    }

    impl Cluster {
        fn new() -> Self {
            let (clock, controller) = timers::mocked_clock();
            let backend = Arc::new(MemoryCoordinator::with_clock(clock.clone()));
            Cluster {
                controller,
                backend,
                clock,
            }
        }

        fn leaser(&self) -> CoordinatedLeaser<MockClock> {
            CoordinatedLeaser::with_clock(
                test_logger(),
                self.backend.clone(),
                DEFAULT_LEASE_KEY,
                TTL,
                LOCK_DELAY,
                self.clock.clone(),
            )
        }

        fn partitionable_leaser(&self) -> (CoordinatedLeaser<MockClock>, Arc<Partitionable>) {
            let link = Arc::new(Partitionable {
                inner: self.backend.clone(),
                partitioned: AtomicBool::new(false),
            });
            let leaser = CoordinatedLeaser::with_clock(
                test_logger(),
                link.clone(),
                DEFAULT_LEASE_KEY,
                TTL,
                LOCK_DELAY,
                self.clock.clone(),
            );
            (leaser, link)
        }
    }

    #[tokio::test]
    async fn acquire_then_observe_from_another_node() {
        let cluster = Cluster::new();
        let a = cluster.leaser();
        let b = cluster.leaser();
        a.open().await.unwrap();
        b.open().await.unwrap();

        assert_eq!(b.primary().await, Err(LeaseError::NoPrimary));

        let lease = a.acquire(&node("a")).await.unwrap();
        assert!(a.is_primary());
        assert_eq!(lease.generation(), 1);
        assert_eq!(lease.ttl(), TTL);

        assert_eq!(
            b.acquire(&node("b")).await.unwrap_err(),
            LeaseError::LeaseHeld { holder: Some(node("a")) }
        );
        assert!(!b.is_primary());
        assert_eq!(b.primary().await.unwrap(), node("a"));
    }

    #[tokio::test]
    async fn lease_stolen_after_expiry_reports_lease_lost() {
        let mut cluster = Cluster::new();
        let a = cluster.leaser();
        let b = cluster.leaser();

        let lease = a.acquire(&node("a")).await.unwrap();

        cluster.controller.advance(TTL + LOCK_DELAY);
        assert!(!a.is_primary());
        let stolen = b.acquire(&node("b")).await.unwrap();
        assert!(stolen.generation() > lease.generation());

        assert_eq!(a.renew(&lease).await.unwrap_err(), LeaseError::LeaseLost);
        assert!(!a.is_primary());
        assert!(b.is_primary());
    }

    #[tokio::test]
    async fn unreachable_backend_stops_primary_claim_at_local_deadline() {
        let mut cluster = Cluster::new();
        let (a, link) = cluster.partitionable_leaser();

        let lease = a.acquire(&node("a")).await.unwrap();
        cluster.controller.advance(TTL / 2);
        let lease = a.renew(&lease).await.unwrap();

        link.partitioned.store(true, Ordering::SeqCst);
        cluster.controller.advance(TTL / 2);
        assert!(matches!(a.renew(&lease).await, Err(LeaseError::Connection(_))));
        assert!(a.is_primary(), "Deadline has not passed yet");

        cluster.controller.advance(TTL / 2);
        assert!(!a.is_primary());
        assert!(matches!(a.open().await, Err(LeaseError::Connection(_))));
    }

    #[tokio::test]
    async fn release_hands_over_after_lock_delay() {
        let mut cluster = Cluster::new();
        let a = cluster.leaser();
        let b = cluster.leaser();

        let lease = a.acquire(&node("a")).await.unwrap();
        a.release(&lease).await.unwrap();
        assert!(!a.is_primary());

        assert!(matches!(
            b.acquire(&node("b")).await,
            Err(LeaseError::LockDelay { .. })
        ));
        cluster.controller.advance(LOCK_DELAY);
        assert!(b.acquire(&node("b")).await.is_ok());
    }

    #[tokio::test]
    async fn closed_leaser_refuses_to_act() {
        let cluster = Cluster::new();
        let a = cluster.leaser();
        let lease = a.acquire(&node("a")).await.unwrap();

        a.close().await;
        assert!(!a.is_primary());
        assert_eq!(a.renew(&lease).await.unwrap_err(), LeaseError::Closed);

        a.open().await.unwrap();
        assert_eq!(a.renew(&lease).await.unwrap_err(), LeaseError::LeaseLost);
    }
}
