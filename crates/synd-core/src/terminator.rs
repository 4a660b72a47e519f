//! One-shot shutdown token shared between cooperating tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use tokio::sync::watch;

/// Per-unit shutdown handle.
///
/// A `Terminator` carries a one-shot quit signal that unblocks any number of
/// waiters, a pair of shutdown phase flags, and a cleanup latch that runs a
/// resource-release closure exactly once no matter how many tasks observe
/// shutdown concurrently.
///
/// Terminators compose: the listener owns a parent token, and every
/// in-flight notification carries its own so that pending work can be
/// cancelled collectively on shutdown.
#[derive(Clone, Debug)]
pub struct Terminator {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    quit: watch::Sender<bool>,
    shutdown_prepared: AtomicBool,
    shutdown: AtomicBool,
    cleanup: Once,
}

impl Terminator {
    pub fn new() -> Self {
        let (quit, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                quit,
                shutdown_prepared: AtomicBool::new(false),
                shutdown: AtomicBool::new(false),
                cleanup: Once::new(),
            }),
        }
    }

    /// Fires the quit signal. Subsequent calls are no-ops.
    pub fn quit(&self) {
        let _ = self.inner.quit.send(true);
    }

    /// Resolves once [`quit`](Self::quit) has been called.
    ///
    /// Safe to await from any number of tasks; all of them unblock.
    pub async fn on_quit(&self) {
        let mut rx = self.inner.quit.subscribe();
        let _ = rx.wait_for(|quitted| *quitted).await;
    }

    /// Whether the quit signal has already fired.
    pub fn is_quit(&self) -> bool {
        *self.inner.quit.borrow()
    }

    /// Marks the owner as preparing to shut down: no new work is accepted.
    pub fn prepare_shutdown(&self) {
        self.inner.shutdown_prepared.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown_prepared(&self) -> bool {
        self.inner.shutdown_prepared.load(Ordering::SeqCst)
    }

    /// Marks shutdown as complete; [`Self::is_shutdown`] turns true forever.
    pub fn complete_shutdown(&self) {
        self.inner.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shutdown.load(Ordering::SeqCst)
    }

    /// Runs `release` exactly once across all clones of this terminator.
    pub fn cleanup(&self, release: impl FnOnce()) {
        self.inner.cleanup.call_once(release);
    }
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new()
    }
}
