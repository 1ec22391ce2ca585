use crate::lease::{Coordinator, CoordinatorError, LockGrant, LockRequest, NodeInfo};
use crate::timers::{Clock, RealClock};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

/// MemoryCoordinator is an in-process coordination backend. Expiry is evaluated lazily on
/// every call, so there is no background task to keep alive.
///
/// Host it behind the gRPC coordinator service to share it between processes.
pub struct MemoryCoordinator<C: Clock = RealClock> {
    clock: C,
    state: Mutex<CoordinatorState>,
}

#[derive(Default)]
struct CoordinatorState {
    keys: HashMap<String, KeyState>,
    next_session: u64,
}

#[derive(Default)]
struct KeyState {
    holder: Option<Holding>,
    locked_until: Option<Instant>,
    generation: u64,
}

struct Holding {
    session: u64,
    node: NodeInfo,
    ttl: Duration,
    lock_delay: Duration,
    expires_at: Instant,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        Self::with_clock(RealClock)
    }
}

impl Default for MemoryCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryCoordinator<C> {
    pub(crate) fn with_clock(clock: C) -> Self {
        MemoryCoordinator {
            clock,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().expect("MemoryCoordinator mutex guard poison")
    }

    /// Returns the key's state with any expired holding already cleared.
    fn key_state<'a>(state: &'a mut CoordinatorState, key: &str, now: Instant) -> &'a mut KeyState {
        let key_state = state.keys.entry(key.to_string()).or_default();
        key_state.expire(now);
        key_state
    }
}

impl KeyState {
    fn expire(&mut self, now: Instant) {
        let expired_at = match &self.holder {
            Some(holding) if holding.expires_at <= now => holding.expires_at,
            _ => return,
        };
        if let Some(holding) = self.holder.take() {
            // Lock-delay counts from the moment of expiry, not from when we noticed.
            self.locked_until = Some(expired_at + holding.lock_delay);
        }
    }

    fn holds(&self, session: u64) -> bool {
        matches!(&self.holder, Some(holding) if holding.session == session)
    }
}

#[async_trait::async_trait]
impl<C: Clock> Coordinator for MemoryCoordinator<C> {
    async fn lock(&self, request: LockRequest) -> Result<LockGrant, CoordinatorError> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        state.next_session += 1;
        let session = state.next_session;
        let key_state = Self::key_state(&mut state, &request.key, now);

        if let Some(holding) = &key_state.holder {
            return Err(CoordinatorError::Held {
                holder: holding.node.clone(),
            });
        }
        if let Some(locked_until) = key_state.locked_until {
            if now < locked_until {
                return Err(CoordinatorError::LockDelay {
                    remaining: locked_until - now,
                });
            }
        }

        key_state.generation += 1;
        key_state.locked_until = None;
        key_state.holder = Some(Holding {
            session,
            node: request.holder,
            ttl: request.ttl,
            lock_delay: request.lock_delay,
            expires_at: now + request.ttl,
        });

        Ok(LockGrant {
            session,
            generation: key_state.generation,
        })
    }

    async fn renew(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let key_state = Self::key_state(&mut state, key, now);

        match &mut key_state.holder {
            Some(holding) if holding.session == session => {
                holding.expires_at = now + holding.ttl;
                Ok(())
            }
            _ => Err(CoordinatorError::SessionInvalid),
        }
    }

    async fn unlock(&self, key: &str, session: u64) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let key_state = Self::key_state(&mut state, key, now);

        if key_state.holds(session) {
            if let Some(holding) = key_state.holder.take() {
                key_state.locked_until = Some(now + holding.lock_delay);
            }
        }

        Ok(())
    }

    async fn holder(&self, key: &str) -> Result<Option<NodeInfo>, CoordinatorError> {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let key_state = Self::key_state(&mut state, key, now);

        Ok(key_state.holder.as_ref().map(|holding| holding.node.clone()))
    }
}
