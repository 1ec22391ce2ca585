use std::sync::Arc;
use tokio::sync::watch;

/// Readiness fires exactly once per process: when the node first becomes primary or first
/// catches up with a primary. Later role changes never un-fire it.
pub(crate) fn new() -> (ReadyNotifier, ReadyListener) {
    let (tx, rx) = watch::channel(false);

    (
        ReadyNotifier {
            tx: Arc::new(tx),
            _rx: rx.clone(),
        },
        ReadyListener { rx },
    )
}

#[derive(Clone)]
pub(crate) struct ReadyNotifier {
    tx: Arc<watch::Sender<bool>>,
    _rx: watch::Receiver<bool>,
}

impl ReadyNotifier {
    /// Returns true only for the call that actually fired the signal.
    pub(crate) fn fire(&self) -> bool {
        if *self.tx.borrow() {
            return false;
        }
        self.tx.send(true).is_ok()
    }
}

#[derive(Clone)]
pub struct ReadyListener {
    rx: watch::Receiver<bool>,
}

impl ReadyListener {
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the node is ready. Returns false if the store shut down first.
    pub async fn wait(&mut self) -> bool {
        loop {
            if *self.rx.borrow() {
                return true;
            }
            if self.rx.changed().await.is_err() {
                return *self.rx.borrow();
            }
        }
    }
}
