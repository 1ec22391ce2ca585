use crate::database::{DatabaseRegistry, PruneReport, RetentionPolicy};
use crate::shutdown::ShutdownSignal;
use crate::timers::{Clock, RealClock};
use std::sync::Arc;
use tokio::time::Duration;

/// RetentionMonitor periodically prunes replicated history that is both outside the
/// retention horizon and no longer needed by any replication session.
pub(crate) struct RetentionMonitor<C: Clock = RealClock> {
    logger: slog::Logger,
    registry: Arc<DatabaseRegistry>,
    policy: RetentionPolicy,
    interval: Duration,
    clock: C,
}

impl<C: Clock> RetentionMonitor<C> {
    pub(crate) fn new(
        logger: slog::Logger,
        registry: Arc<DatabaseRegistry>,
        policy: RetentionPolicy,
        interval: Duration,
        clock: C,
    ) -> Self {
        RetentionMonitor {
            logger,
            registry,
            policy,
            interval,
            clock,
        }
    }

    pub(crate) async fn run(mut self, mut shutdown: ShutdownSignal) {
        slog::debug!(
            self.logger,
            "Enforcing retention of {:?} every {:?}",
            self.policy.duration,
            self.interval
        );
        loop {
            tokio::select! {
                _ = self.clock.sleep(self.interval) => {
                    self.enforce_once();
                }
                _ = shutdown.wait() => return,
            }
        }
    }

    /// One sweep over every database.
    pub(crate) fn enforce_once(&self) -> PruneReport {
        let now = self.clock.now();
        let mut total = PruneReport::default();

        for db in self.registry.list() {
            let report = db.enforce_retention(now, &self.policy);
            if report.pruned_frames > 0 || report.forgotten_sessions > 0 {
                slog::debug!(
                    self.logger,
                    "Pruned {} frames of '{}' (boundary now {}), forgot {} sessions",
                    report.pruned_frames,
                    db.name(),
                    db.boundary(),
                    report.forgotten_sessions
                );
            }
            total.pruned_frames += report.pruned_frames;
            total.forgotten_sessions += report.forgotten_sessions;
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Position;
    use crate::shutdown::shutdown_signal;
    use crate::timers::mocked_clock;
    use bytes::Bytes;
    use tokio::time::Instant;

    const MINUTE: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn sweeps_prune_only_expired_history() {
        let (clock, mut controller) = mocked_clock();
        let registry = Arc::new(DatabaseRegistry::new());
        let db = registry.get_or_create("app.db");
        for i in 0..3 {
            db.append(1, Bytes::from(format!("tx-{}", i)), Instant::now());
        }

        let (shutdown, signal) = shutdown_signal();
        let monitor = RetentionMonitor::new(
            slog::Logger::root(slog::Discard, slog::o!()),
            registry.clone(),
            RetentionPolicy {
                duration: 10 * MINUTE,
                max_frames: None,
            },
            MINUTE,
            clock,
        );
        let task = tokio::spawn(monitor.run(signal));

        controller.advance(MINUTE);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(db.boundary(), Position::ZERO);

        controller.advance(10 * MINUTE);
        let pruned = async {
            while db.boundary() != Position::new(1, 3) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), pruned)
            .await
            .expect("History was never pruned");

        drop(shutdown);
        task.await.unwrap();
    }

    #[test]
    fn frame_horizon_applies_without_waiting_for_age() {
        let (clock, _controller) = mocked_clock();
        let registry = Arc::new(DatabaseRegistry::new());
        for name in ["a.db", "b.db"].iter() {
            let db = registry.get_or_create(name);
            for i in 0..4 {
                db.append(1, Bytes::from(format!("tx-{}", i)), Instant::now());
            }
        }

        let monitor = RetentionMonitor::new(
            slog::Logger::root(slog::Discard, slog::o!()),
            registry.clone(),
            RetentionPolicy {
                duration: 10 * MINUTE,
                max_frames: Some(1),
            },
            MINUTE,
            clock,
        );

        assert_eq!(
            monitor.enforce_once(),
            PruneReport {
                pruned_frames: 6,
                forgotten_sessions: 0,
            }
        );
        assert_eq!(registry.get("b.db").unwrap().boundary(), Position::new(1, 3));
    }
}
