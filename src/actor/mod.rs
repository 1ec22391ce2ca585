use crate::database::Position;
use crate::lease::{Lease, NodeInfo};
use crate::store::{CommitError, CommitInput, LocalStore};
use std::error::Error;
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};

pub(crate) fn create(buffer_size: usize, store: LocalStore) -> (ActorClient, StoreActor) {
    let (tx, rx) = mpsc::channel(buffer_size);
    let client = ActorClient { sender: tx };
    let actor = StoreActor { receiver: rx, store };

    (client, actor)
}

// Commit admission and role transitions share one queue, so a demotion can never interleave
// with an in-progress commit.
#[derive(Debug)]
enum Event {
    // Primary: append and return the new position.
    // Anything else: reject, pointing at the known primary.
    Commit(CommitInput, Callback<Position, CommitError>),

    // Lease acquired. Acked once commits are being admitted.
    Promote(Lease, oneshot::Sender<()>),

    LeaseRenewed(Lease),

    // Lease lost or released. Back to Initializing while the election re-runs.
    Demote(oneshot::Sender<()>),

    FollowPrimary(NodeInfo),

    // Leaser backend unreachable.
    Disconnect,
}

#[derive(Debug)]
struct Callback<O: Debug, E: Error>(oneshot::Sender<Result<O, E>>);

impl<O: Debug, E: Error> Callback<O, E> {
    pub fn send(self, message: Result<O, E>) {
        let _ = self.0.send(message);
    }
}

#[derive(Clone)]
pub(crate) struct ActorClient {
    sender: mpsc::Sender<Event>,
}

impl ActorClient {
    pub(crate) async fn commit(&self, input: CommitInput) -> Result<Position, CommitError> {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Event::Commit(input, Callback(tx))).await.is_err() {
            return Err(CommitError::Closed);
        }

        rx.await.unwrap_or(Err(CommitError::Closed))
    }

    pub(crate) async fn promote(&self, lease: Lease) {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Promote(lease, tx)).await;
        let _ = rx.await;
    }

    pub(crate) async fn lease_renewed(&self, lease: Lease) {
        self.send(Event::LeaseRenewed(lease)).await;
    }

    pub(crate) async fn demote(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Demote(tx)).await;
        let _ = rx.await;
    }

    pub(crate) async fn follow_primary(&self, primary: NodeInfo) {
        self.send(Event::FollowPrimary(primary)).await;
    }

    pub(crate) async fn disconnect(&self) {
        self.send(Event::Disconnect).await;
    }

    // Role events only matter while the store is alive.
    async fn send(&self, event: Event) {
        let _ = self.sender.send(event).await;
    }
}

/// StoreActor is store logic in actor model.
pub(crate) struct StoreActor {
    receiver: mpsc::Receiver<Event>,
    store: LocalStore,
}

impl StoreActor {
    pub(crate) async fn run_event_loop(mut self) {
        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event);
        }
    }

    // This must NOT be async. Any long running work belongs to the election loop, which reports
    // back through this actor.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Commit(input, callback) => {
                let result = self.store.commit(input);
                callback.send(result);
            }
            Event::Promote(lease, ack) => {
                self.store.promote(lease);
                let _ = ack.send(());
            }
            Event::LeaseRenewed(lease) => {
                self.store.lease_renewed(lease);
            }
            Event::Demote(ack) => {
                self.store.demote();
                let _ = ack.send(());
            }
            Event::FollowPrimary(primary) => {
                self.store.follow(primary);
            }
            Event::Disconnect => {
                self.store.disconnect();
            }
        }
    }
}
