use crate::lease::NodeInfo;
use crate::store::{RoleChangeListener, RoleSnapshot};

/// The role of a store, as observed locally.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreRole {
    /// Election in progress.
    Initializing,
    Primary,
    Replica { primary: NodeInfo },
    /// The lease backend is unreachable.
    Disconnected,
}

/// An event that happened, as observed by the local store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Consuming this event type is subtle. Intermediate roles are not queued: if several
    /// transitions happen between two calls to `next_event()`, only the latest is seen.
    RoleChanged(StoreRole),
}

pub struct EventListener {
    role_change_listener: RoleChangeListener,
}

impl EventListener {
    pub(crate) fn new(role_change_listener: RoleChangeListener) -> Self {
        EventListener { role_change_listener }
    }

    /// `next_event()` returns the next event that the local store observes. `None` once the
    /// store is closed.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.role_change_listener
            .next()
            .await
            .map(|role| Event::RoleChanged(StoreRole::from(role)))
    }
}

// ------- Conversions --------

impl From<RoleSnapshot> for StoreRole {
    fn from(role: RoleSnapshot) -> Self {
        match role {
            RoleSnapshot::Initializing => StoreRole::Initializing,
            RoleSnapshot::Primary => StoreRole::Primary,
            RoleSnapshot::Replica(primary) => StoreRole::Replica { primary },
            RoleSnapshot::Disconnected => StoreRole::Disconnected,
        }
    }
}
