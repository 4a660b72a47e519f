//! Pause/acknowledge rendezvous between export jobs and the listener.

use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::{Error, Result, TRACING_TARGET_COORDINATION};

/// How long a job initiator waits for the listener to pick up the pause
/// request.
const LOCK_INIT_TIMEOUT: Duration = Duration::from_secs(3);

/// How long a job initiator waits for the listener to acknowledge that
/// consumption has stopped.
const ACK_TIMEOUT: Duration = Duration::from_secs(20);

/// How long the listener keeps trying to deliver an acknowledgement; the
/// initiator may have given up already.
const ACK_SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Two-channel rendezvous that serializes a full or targeted export against
/// the streaming listener.
///
/// The initiator side ([`lock`](Self::lock) / [`unlock`](Self::unlock)) is
/// used by the HTTP entry point; the listener side
/// ([`lock_request`](Self::lock_request) / [`ack`](Self::ack)) is selected on
/// from the listener main loop. Because a lock only succeeds once the
/// listener has sent an acknowledgement, the listener is provably paused
/// before the job starts reading the document store.
#[derive(Debug)]
pub struct Locker {
    locked_tx: mpsc::Sender<bool>,
    locked_rx: Mutex<mpsc::Receiver<bool>>,
    acked_tx: mpsc::Sender<()>,
    acked_rx: Mutex<mpsc::Receiver<()>>,
}

impl Locker {
    pub fn new() -> Self {
        let (locked_tx, locked_rx) = mpsc::channel(1);
        let (acked_tx, acked_rx) = mpsc::channel(1);
        Self {
            locked_tx,
            locked_rx: Mutex::new(locked_rx),
            acked_tx,
            acked_rx: Mutex::new(acked_rx),
        }
    }

    /// Requests a listener pause and waits for the acknowledgement.
    ///
    /// # Errors
    ///
    /// [`Error::LockInitiationTimedOut`] when the pause request is not picked
    /// up within 3 seconds, [`Error::ConsumptionHaltTimedOut`] when no
    /// acknowledgement arrives within 20 seconds.
    pub async fn lock(&self) -> Result<()> {
        self.locked_tx
            .send_timeout(true, LOCK_INIT_TIMEOUT)
            .await
            .map_err(|_| Error::LockInitiationTimedOut)?;
        tracing::info!(target: TRACING_TARGET_COORDINATION, "Lock initiated");

        let mut acked = self.acked_rx.lock().await;
        match tokio::time::timeout(ACK_TIMEOUT, acked.recv()).await {
            Ok(Some(())) => {
                tracing::info!(target: TRACING_TARGET_COORDINATION, "Locker acquired");
                Ok(())
            }
            _ => Err(Error::ConsumptionHaltTimedOut),
        }
    }

    /// Releases the lock, resuming the listener.
    pub async fn unlock(&self) {
        if self.locked_tx.send(false).await.is_err() {
            tracing::warn!(
                target: TRACING_TARGET_COORDINATION,
                "Resume request dropped: listener side is gone"
            );
        }
    }

    /// Receives the next pause (`true`) or resume (`false`) request.
    ///
    /// Listener side; resolves to `None` only if all initiator handles are
    /// dropped.
    pub async fn lock_request(&self) -> Option<bool> {
        self.locked_rx.lock().await.recv().await
    }

    /// Acknowledges a pause request. Returns whether the initiator still
    /// listened for it.
    pub async fn ack(&self) -> bool {
        self.acked_tx.send_timeout((), ACK_SEND_TIMEOUT).await.is_ok()
    }
}

impl Default for Locker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn lock_completes_after_listener_ack() {
        let locker = Arc::new(Locker::new());

        let listener = {
            let locker = locker.clone();
            tokio::spawn(async move {
                let paused = locker.lock_request().await;
                assert_eq!(paused, Some(true));
                assert!(locker.ack().await);
                // Hold the pause until the initiator resumes.
                let resumed = locker.lock_request().await;
                assert_eq!(resumed, Some(false));
            })
        };

        locker.lock().await.expect("lock should succeed");
        locker.unlock().await;
        listener.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn lock_times_out_without_listener() {
        let locker = Locker::new();

        // First request parks in the capacity-1 channel, second blocks until
        // the 3 second budget expires.
        locker
            .locked_tx
            .send(true)
            .await
            .expect("channel has capacity for one request");

        let err = locker.lock().await.expect_err("nobody is listening");
        assert!(matches!(err, Error::LockInitiationTimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn lock_times_out_without_ack() {
        let locker = Arc::new(Locker::new());

        let drained = {
            let locker = locker.clone();
            tokio::spawn(async move {
                // Pick up the pause request but never acknowledge it.
                locker.lock_request().await
            })
        };

        let err = locker.lock().await.expect_err("ack never arrives");
        assert!(matches!(err, Error::ConsumptionHaltTimedOut));
        assert_eq!(drained.await.unwrap(), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn ack_reports_abandoned_initiator() {
        let locker = Locker::new();
        // No initiator waits on the ack channel beyond its capacity of one.
        assert!(locker.ack().await);
        assert!(!locker.ack().await);
    }
}
