//! Listener state machine driving incremental export.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures::StreamExt;
use synd_core::{Locker, Terminator};
use tokio::sync::{Semaphore, mpsc};

use crate::TRACING_TARGET_LISTENER;
use crate::consumer::{PublicationConsumer, PublicationMessage};
use crate::mapper::MessageMapper;
use crate::notification::Notification;
use crate::notification::NotificationHandler;
use crate::policy::PolicyAgent;

/// Poll interval while the listener is paused by an export lock.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll interval while [`Listener::stop`] waits for the terminal state.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consumes publication events, maps and policy-checks them, and dispatches
/// accepted notifications onto a bounded worker pool.
///
/// The listener cooperates with the export [`Locker`]: while paused it stops
/// pulling work at the consumer boundary, polling every 500 ms until the
/// lock is released. On shutdown every pending notification receives a quit
/// signal so that handlers blocked in the notification delay unblock
/// promptly.
pub struct Listener {
    locker: Arc<Locker>,
    paused: RwLock<bool>,
    received_tx: Mutex<Option<mpsc::Sender<Notification>>>,
    received_rx: tokio::sync::Mutex<Option<mpsc::Receiver<Notification>>>,
    pending: RwLock<HashMap<String, Notification>>,
    terminator: Terminator,
    workers: Arc<Semaphore>,
    mapper: MessageMapper,
    policy: Arc<dyn PolicyAgent>,
    handler: NotificationHandler,
}

impl Listener {
    pub fn new(
        handler: NotificationHandler,
        mapper: MessageMapper,
        policy: Arc<dyn PolicyAgent>,
        locker: Arc<Locker>,
        max_concurrency: usize,
    ) -> Arc<Self> {
        // Capacity 1: back-pressure from the dispatch loop throttles the
        // consumer directly.
        let (received_tx, received_rx) = mpsc::channel(1);
        Arc::new(Self {
            locker,
            paused: RwLock::new(false),
            received_tx: Mutex::new(Some(received_tx)),
            received_rx: tokio::sync::Mutex::new(Some(received_rx)),
            pending: RwLock::new(HashMap::new()),
            terminator: Terminator::new(),
            workers: Arc::new(Semaphore::new(max_concurrency)),
            mapper,
            policy,
            handler,
        })
    }

    /// Starts consuming from the stream and runs the listener main loop
    /// until [`stop`](Self::stop) is called.
    pub async fn start(self: Arc<Self>, consumer: PublicationConsumer) {
        tokio::spawn(Arc::clone(&self).consume(consumer));
        tokio::spawn(Arc::clone(&self).handle_notifications());
        self.run().await;
    }

    /// Signals shutdown and blocks until the dispatch loop has drained.
    pub async fn stop(&self) {
        self.terminator.quit();
        while !self.terminator.is_shutdown() {
            tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
        }
    }

    /// Main control loop: multiplexes lock requests and the quit signal.
    pub async fn run(&self) {
        loop {
            tokio::select! {
                request = self.locker.lock_request() => match request {
                    Some(true) => {
                        tracing::info!(target: TRACING_TARGET_LISTENER, "LOCK signal received: pausing");
                        self.pause();
                        if self.locker.ack().await {
                            tracing::info!(target: TRACING_TARGET_LISTENER, "LOCK acked");
                        } else {
                            tracing::info!(
                                target: TRACING_TARGET_LISTENER,
                                "LOCK acking timed out, maybe the initiator quit already"
                            );
                        }
                    }
                    Some(false) => {
                        tracing::info!(target: TRACING_TARGET_LISTENER, "LOCK signal received: resuming");
                        self.resume();
                    }
                    None => {}
                },
                () = self.terminator.on_quit() => {
                    tracing::info!(target: TRACING_TARGET_LISTENER, "QUIT signal received");
                    break;
                }
            }
        }

        self.terminator.prepare_shutdown();
        self.terminate_pending_notifications();
        // Close the received channel ourselves so the dispatch loop reaches
        // its terminal state even if the consumer never delivers again.
        self.cleanup();
    }

    /// Handles one raw message from the consumer. Returns whether the
    /// message was fully handled and may be acknowledged; `false` means it
    /// was abandoned mid-dispatch by shutdown and should be redelivered.
    pub async fn handle_message(&self, msg: &PublicationMessage) -> bool {
        if self.terminator.is_shutdown_prepared() {
            self.cleanup();
            return true;
        }

        let tid = msg.tid.as_str();

        if self.is_paused() {
            tracing::info!(target: TRACING_TARGET_LISTENER, tid, "PAUSED handling message");
            while self.is_paused() {
                if self.terminator.is_shutdown_prepared() {
                    self.cleanup();
                    return true;
                }
                tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
            }
            tracing::info!(target: TRACING_TARGET_LISTENER, tid, "PAUSE finished, resuming message handling");
        }

        let notification = match self.mapper.map_notification(msg) {
            Ok(notification) => notification,
            Err(err) if err.is_filter() => {
                tracing::info!(target: TRACING_TARGET_LISTENER, tid, error = %err, "Skipping event");
                return true;
            }
            Err(err) => {
                tracing::warn!(target: TRACING_TARGET_LISTENER, tid, error = %err, "Skipping event");
                return true;
            }
        };

        let query = serde_json::json!({
            "payload": { "publication": notification.stub.publication }
        });
        match self.policy.evaluate_content_policy(query).await {
            Ok(decision) if decision.skip => {
                tracing::info!(
                    target: TRACING_TARGET_LISTENER,
                    tid,
                    uuid = %notification.stub.uuid,
                    reasons = ?decision.reasons,
                    "Skipping restricted content"
                );
                return true;
            }
            Ok(_) => {}
            Err(err) => {
                // The event is lost; delivery is at-least-once only while
                // the evaluator is reachable.
                tracing::error!(target: TRACING_TARGET_LISTENER, tid, error = %err, "Error with policy evaluation");
                return true;
            }
        }

        self.write_pending()
            .insert(notification.tid.clone(), notification.clone());

        let sender = self.lock_sender().clone();
        let Some(sender) = sender else {
            return false;
        };

        tokio::select! {
            sent = sender.send(notification.clone()) => {
                if sent.is_err() {
                    tracing::error!(
                        target: TRACING_TARGET_LISTENER,
                        tid,
                        uuid = %notification.stub.uuid,
                        "Notification handling is terminated"
                    );
                    return false;
                }
            }
            () = notification.terminator.on_quit() => {
                tracing::error!(
                    target: TRACING_TARGET_LISTENER,
                    tid,
                    uuid = %notification.stub.uuid,
                    "Notification handling is terminated"
                );
                return false;
            }
        }

        if self.terminator.is_shutdown_prepared() {
            self.cleanup();
        }
        true
    }

    /// Dispatch loop: drains accepted notifications onto the worker pool.
    /// Exits once the received channel closes, which marks the listener as
    /// shut down.
    pub async fn handle_notifications(self: Arc<Self>) {
        let receiver = self.received_rx.lock().await.take();
        let Some(mut receiver) = receiver else {
            tracing::warn!(target: TRACING_TARGET_LISTENER, "Notification dispatch already running");
            return;
        };

        tracing::info!(target: TRACING_TARGET_LISTENER, "Started handling notifications");
        while let Some(notification) = receiver.recv().await {
            if self.is_paused() {
                tracing::info!(
                    target: TRACING_TARGET_LISTENER,
                    tid = %notification.tid,
                    "PAUSED handling notification"
                );
                while self.is_paused() {
                    tokio::time::sleep(PAUSE_POLL_INTERVAL).await;
                }
                tracing::info!(
                    target: TRACING_TARGET_LISTENER,
                    tid = %notification.tid,
                    "PAUSE finished, resuming notification handling"
                );
            }

            let Ok(permit) = Arc::clone(&self.workers).acquire_owned().await else {
                break;
            };

            let listener = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                match listener.handler.handle(&notification).await {
                    Ok(()) => tracing::info!(
                        target: TRACING_TARGET_LISTENER,
                        tid = %notification.tid,
                        uuid = %notification.stub.uuid,
                        event_type = %notification.ev_type,
                        "Successfully handled notification"
                    ),
                    Err(err) => tracing::error!(
                        target: TRACING_TARGET_LISTENER,
                        tid = %notification.tid,
                        uuid = %notification.stub.uuid,
                        event_type = %notification.ev_type,
                        error = %err,
                        "Failed to handle notification"
                    ),
                }
                listener.write_pending().remove(&notification.tid);
            });
        }
        tracing::info!(target: TRACING_TARGET_LISTENER, "Stopped handling notifications");
        self.terminator.complete_shutdown();
    }

    /// Bridges the stream consumer into [`handle_message`](Self::handle_message).
    async fn consume(self: Arc<Self>, consumer: PublicationConsumer) {
        let mut messages = match consumer.messages().await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET_LISTENER,
                    error = %err,
                    "Failed to start consuming publication events"
                );
                return;
            }
        };

        loop {
            tokio::select! {
                next = messages.next() => match next {
                    Some(Ok(message)) => {
                        let publication = PublicationMessage::from(&message);
                        if self.handle_message(&publication).await
                            && let Err(err) = message.ack().await
                        {
                            tracing::warn!(
                                target: TRACING_TARGET_LISTENER,
                                error = %err,
                                "Failed to acknowledge publication event"
                            );
                        }
                    }
                    Some(Err(err)) => {
                        tracing::warn!(
                            target: TRACING_TARGET_LISTENER,
                            error = %err,
                            "Error receiving publication event"
                        );
                    }
                    None => break,
                },
                () = self.terminator.on_quit() => break,
            }
        }

        consumer.close().await;
    }

    fn pause(&self) {
        tracing::debug!(target: TRACING_TARGET_LISTENER, "Pausing message consumption");
        *self.paused.write().unwrap_or_else(|e| e.into_inner()) = true;
    }

    fn resume(&self) {
        tracing::debug!(target: TRACING_TARGET_LISTENER, "Resuming message consumption");
        *self.paused.write().unwrap_or_else(|e| e.into_inner()) = false;
    }

    fn is_paused(&self) -> bool {
        *self.paused.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Releases the received channel exactly once.
    fn cleanup(&self) {
        self.terminator.cleanup(|| {
            self.lock_sender().take();
        });
    }

    fn terminate_pending_notifications(&self) {
        let pending = self.pending.read().unwrap_or_else(|e| e.into_inner());
        for notification in pending.values() {
            notification.terminator.quit();
        }
    }

    fn lock_sender(&self) -> std::sync::MutexGuard<'_, Option<mpsc::Sender<Notification>>> {
        self.received_tx.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn write_pending(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Notification>> {
        self.pending.write().unwrap_or_else(|e| e.into_inner())
    }
}
