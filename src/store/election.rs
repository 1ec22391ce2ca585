use crate::actor::ActorClient;
use crate::lease::{Lease, LeaseError, Leaser, NodeInfo};
use crate::replication::FrameConsumer;
use crate::shutdown::ShutdownSignal;
use crate::timers::{Backoff, Clock, RealClock};
use std::cmp;
use std::sync::Arc;
use tokio::time::Duration;

#[derive(Clone, Debug)]
pub(crate) struct ElectionTimings {
    /// How often the primary renews its lease. Shorter than the lease TTL.
    pub(crate) renew_interval: Duration,
    pub(crate) backoff_min: Duration,
    pub(crate) backoff_max: Duration,
    /// Upper bound on the best effort lease release at shutdown.
    pub(crate) release_timeout: Duration,
}

enum Step {
    Open,
    Elect,
    Lead(Lease),
    Follow(NodeInfo),
    Reconnect,
    Shutdown,
}

/// ElectionDriver runs the election state machine of one store:
///
/// ```text
/// Open -> Elect -> Lead ----(lease lost)----> Elect
///           |        \---(backend lost)----> Reconnect -> Open
///           \------> Follow --(stream ends)--> Elect
/// ```
///
/// It never touches the role itself; every transition goes through the store actor.
pub(crate) struct ElectionDriver<C: Clock = RealClock> {
    logger: slog::Logger,
    node: NodeInfo,
    candidate: bool,
    leaser: Arc<dyn Leaser>,
    actor: ActorClient,
    consumer: FrameConsumer,
    timings: ElectionTimings,
    backoff: Backoff,
    clock: C,
    shutdown: ShutdownSignal,
}

impl<C: Clock> ElectionDriver<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        node: NodeInfo,
        candidate: bool,
        leaser: Arc<dyn Leaser>,
        actor: ActorClient,
        consumer: FrameConsumer,
        timings: ElectionTimings,
        clock: C,
        shutdown: ShutdownSignal,
    ) -> Self {
        let backoff = Backoff::new(timings.backoff_min, timings.backoff_max);
        ElectionDriver {
            logger,
            node,
            candidate,
            leaser,
            actor,
            consumer,
            timings,
            backoff,
            clock,
            shutdown,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut step = Step::Open;
        loop {
            step = match step {
                Step::Open => self.open().await,
                Step::Elect => self.elect().await,
                Step::Lead(lease) => self.lead(lease).await,
                Step::Follow(primary) => self.follow(primary).await,
                Step::Reconnect => self.reconnect().await,
                Step::Shutdown => break,
            };
        }

        self.leaser.close().await;
        slog::info!(self.logger, "Election loop stopped");
    }

    async fn open(&mut self) -> Step {
        loop {
            if self.shutdown.is_triggered() {
                return Step::Shutdown;
            }
            match self.leaser.open().await {
                Ok(()) => {
                    // Leaves Disconnected, if we were there.
                    self.actor.demote().await;
                    return Step::Elect;
                }
                Err(e) => {
                    slog::debug!(self.logger, "Failed to open leaser: {}", e);
                    self.actor.disconnect().await;
                    if !self.pause(None).await {
                        return Step::Shutdown;
                    }
                }
            }
        }
    }

    async fn elect(&mut self) -> Step {
        if self.shutdown.is_triggered() {
            return Step::Shutdown;
        }

        let mut lock_delay = None;
        if self.candidate {
            match self.leaser.acquire(&self.node).await {
                Ok(lease) => return Step::Lead(lease),
                Err(LeaseError::LeaseHeld { .. }) => {}
                Err(LeaseError::LockDelay { remaining }) => lock_delay = Some(remaining),
                Err(LeaseError::Connection(e)) => {
                    slog::warn!(self.logger, "Lease backend unreachable: {}", e);
                    return Step::Reconnect;
                }
                Err(LeaseError::Closed) => return Step::Shutdown,
                Err(e) => slog::debug!(self.logger, "Acquire failed: {}", e),
            }
        }

        match self.leaser.primary().await {
            Ok(primary) if primary.hostname != self.node.hostname => {
                return Step::Follow(primary);
            }
            Ok(_) => slog::debug!(self.logger, "Lease backend still names us as primary"),
            Err(LeaseError::NoPrimary) => slog::debug!(self.logger, "No primary yet"),
            Err(LeaseError::Connection(e)) => {
                slog::warn!(self.logger, "Lease backend unreachable: {}", e);
                return Step::Reconnect;
            }
            Err(LeaseError::Closed) => return Step::Shutdown,
            Err(e) => slog::debug!(self.logger, "Primary lookup failed: {}", e),
        }

        if self.pause(lock_delay).await {
            Step::Elect
        } else {
            Step::Shutdown
        }
    }

    async fn lead(&mut self, lease: Lease) -> Step {
        self.backoff.reset();
        self.actor.promote(lease.clone()).await;

        let mut lease = lease;
        let mut delay = self.timings.renew_interval;
        loop {
            tokio::select! {
                _ = self.clock.sleep(delay) => {}
                _ = self.shutdown.wait() => {
                    self.release(&lease).await;
                    return Step::Shutdown;
                }
            }

            match self.leaser.renew(&lease).await {
                Ok(renewed) => {
                    lease = renewed;
                    delay = self.timings.renew_interval;
                    self.actor.lease_renewed(lease.clone()).await;
                }
                Err(LeaseError::Connection(e)) => {
                    if !self.leaser.is_primary() {
                        slog::warn!(self.logger, "Lease expired while backend was unreachable: {}", e);
                        self.actor.demote().await;
                        return Step::Reconnect;
                    }
                    slog::debug!(self.logger, "Renewal failed, retrying: {}", e);
                    delay = self.timings.renew_interval / 4;
                }
                Err(LeaseError::Closed) => {
                    self.actor.demote().await;
                    return Step::Shutdown;
                }
                Err(e) => {
                    slog::warn!(self.logger, "Lease lost: {}", e);
                    self.actor.demote().await;
                    return Step::Elect;
                }
            }
        }
    }

    async fn follow(&mut self, primary: NodeInfo) -> Step {
        self.actor.follow_primary(primary.clone()).await;

        let progress_before = self.consumer.progress();
        let result = tokio::select! {
            result = self.consumer.replicate(&primary) => result,
            _ = self.shutdown.wait() => return Step::Shutdown,
        };
        let made_progress = self.consumer.progress() > progress_before;

        match result {
            Ok(()) => {
                slog::info!(self.logger, "Primary {:?} ended replication", primary);
                self.backoff.reset();
            }
            Err(e) if made_progress => {
                slog::info!(self.logger, "Replication from {:?} stopped: {}", primary, e);
                self.backoff.reset();
            }
            // Nothing applied: keep backing off until the primary can serve us again.
            Err(e) => slog::debug!(self.logger, "Replication from {:?} failed: {}", primary, e),
        }

        if self.pause(None).await {
            Step::Elect
        } else {
            Step::Shutdown
        }
    }

    async fn reconnect(&mut self) -> Step {
        self.actor.disconnect().await;
        if self.pause(None).await {
            Step::Open
        } else {
            Step::Shutdown
        }
    }

    async fn release(&mut self, lease: &Lease) {
        slog::info!(self.logger, "Releasing lease");
        // Stop admitting commits before anybody else can take over.
        self.actor.demote().await;
        match tokio::time::timeout(self.timings.release_timeout, self.leaser.release(lease)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => slog::warn!(self.logger, "Failed to release lease: {}", e),
            Err(_) => slog::warn!(self.logger, "Timed out releasing lease"),
        }
    }

    /// Sleeps for the next backoff delay, or at most `hint` when the wait has a known end.
    /// Returns false if shutdown interrupted it.
    async fn pause(&mut self, hint: Option<Duration>) -> bool {
        let delay = match hint {
            Some(hint) => cmp::min(hint, self.backoff.max()),
            None => self.backoff.next_delay(),
        };

        tokio::select! {
            _ = self.clock.sleep(delay) => true,
            _ = self.shutdown.wait() => false,
        }
    }
}
