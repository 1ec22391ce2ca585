use crate::database::{DatabaseRegistry, Position};
use crate::lease::{Lease, Leaser, NodeInfo};
use crate::store::{ReadyNotifier, RoleChangeNotifier, RoleSnapshot};
use bytes::Bytes;
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Debug)]
pub(crate) struct CommitInput {
    pub(crate) database: String,
    pub(crate) data: Bytes,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum CommitError {
    #[error("Not primary, writes go to {primary:?}")]
    NotPrimary { primary: Option<NodeInfo> },
    // Store logic runs on a background task. This error is returned if the task has exited.
    #[error("Store is closed")]
    Closed,
}

/// LocalStore is the state the store actor owns: the lease held (if any), the role, and the
/// admission decision for every commit. Nothing else mutates the role.
pub(crate) struct LocalStore {
    logger: slog::Logger,
    leaser: Arc<dyn Leaser>,
    registry: Arc<DatabaseRegistry>,
    role: RoleChangeNotifier,
    ready: ReadyNotifier,
    lease: Option<Lease>,
    primary: Option<NodeInfo>,
}

impl LocalStore {
    pub(crate) fn new(
        logger: slog::Logger,
        leaser: Arc<dyn Leaser>,
        registry: Arc<DatabaseRegistry>,
        role: RoleChangeNotifier,
        ready: ReadyNotifier,
    ) -> Self {
        LocalStore {
            logger,
            leaser,
            registry,
            role,
            ready,
            lease: None,
            primary: None,
        }
    }

    pub(crate) fn commit(&mut self, input: CommitInput) -> Result<Position, CommitError> {
        let generation = match &self.lease {
            // The leaser turns false as soon as it sees the lease go, which may be before the
            // election loop gets around to demoting us.
            Some(lease) if self.leaser.is_primary() => lease.generation(),
            _ => {
                return Err(CommitError::NotPrimary {
                    primary: self.primary.clone(),
                })
            }
        };

        let db = self.registry.get_or_create(&input.database);
        Ok(db.append(generation, input.data, Instant::now()))
    }

    pub(crate) fn promote(&mut self, lease: Lease) {
        slog::info!(
            self.logger,
            "Became primary with lease generation {} (ttl {:?})",
            lease.generation(),
            lease.ttl()
        );
        self.primary = Some(lease.owner().clone());
        self.lease = Some(lease);
        self.set_role(RoleSnapshot::Primary);

        if self.ready.fire() {
            slog::info!(self.logger, "Ready");
        }
    }

    pub(crate) fn lease_renewed(&mut self, lease: Lease) {
        if self.lease.is_some() {
            self.lease = Some(lease);
        }
    }

    pub(crate) fn demote(&mut self) {
        if self.lease.take().is_some() {
            slog::warn!(self.logger, "Lost primary role");
        }
        self.primary = None;
        self.set_role(RoleSnapshot::Initializing);
    }

    pub(crate) fn follow(&mut self, primary: NodeInfo) {
        self.lease = None;
        self.primary = Some(primary.clone());
        self.set_role(RoleSnapshot::Replica(primary));
    }

    pub(crate) fn disconnect(&mut self) {
        self.lease = None;
        self.primary = None;
        self.set_role(RoleSnapshot::Disconnected);
    }

    fn set_role(&self, role: RoleSnapshot) {
        if self.role.current() == role {
            return;
        }
        slog::info!(self.logger, "Role is now {:?}", role);
        self.role.notify_new_role(role);
    }
}
