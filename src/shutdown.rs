use tokio::sync::watch;

/// Creates the process-wide shutdown pair. Every background task holds a clone of the signal;
/// dropping (or explicitly triggering) the handle tells all of them to wind down.
pub(crate) fn shutdown_signal() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);

    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

pub(crate) struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub(crate) fn trigger(self) {
        // Drop does the work.
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Clone)]
pub(crate) struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub(crate) fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown was triggered. Cancel safe, so it can sit in a `select!` loop.
    pub(crate) async fn wait(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }

            // Sender is gone, which also means shutdown.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Duration;

    #[tokio::test]
    async fn dropping_handle_wakes_every_clone() {
        let (handle, signal) = shutdown_signal();
        let mut first = signal.clone();
        let mut second = signal.clone();
        assert!(!signal.is_triggered());

        tokio::time::timeout(Duration::from_millis(20), first.wait())
            .await
            .expect_err("Expected shutdown to be pending");

        handle.trigger();

        first.wait().await;
        second.wait().await;
        assert!(signal.is_triggered());
    }
}
