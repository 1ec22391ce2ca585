use crate::lease::NodeInfo;
use tokio::sync::watch;

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RoleSnapshot {
    Initializing,
    Primary,
    Replica(NodeInfo),
    Disconnected,
}

pub(crate) fn new(initial_role: RoleSnapshot) -> (RoleChangeNotifier, RoleChangeListener) {
    let (snd, rcv) = watch::channel(initial_role);

    (RoleChangeNotifier { snd }, RoleChangeListener { rcv })
}

/// Only the store actor holds the notifier; role is mutated nowhere else.
pub(crate) struct RoleChangeNotifier {
    snd: watch::Sender<RoleSnapshot>,
}

impl RoleChangeNotifier {
    pub(crate) fn notify_new_role(&self, new_role: RoleSnapshot) {
        let _ = self.snd.send(new_role);
    }

    pub(crate) fn current(&self) -> RoleSnapshot {
        self.snd.borrow().clone()
    }
}

#[derive(Clone)]
pub(crate) struct RoleChangeListener {
    rcv: watch::Receiver<RoleSnapshot>,
}

impl RoleChangeListener {
    pub(crate) fn current(&self) -> RoleSnapshot {
        self.rcv.borrow().clone()
    }

    pub(crate) fn is_primary(&self) -> bool {
        *self.rcv.borrow() == RoleSnapshot::Primary
    }

    /// Waits for the next role change. `None` once the store is gone.
    pub(crate) async fn next(&mut self) -> Option<RoleSnapshot> {
        match self.rcv.changed().await {
            Ok(_) => Some(self.rcv.borrow().clone()),
            Err(_) => None,
        }
    }
}
