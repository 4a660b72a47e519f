//! Export notifications and their handler.

use std::sync::Arc;
use std::time::Duration;

use synd_core::{Stub, Terminator};
use synd_engine::Exporter;

use crate::{Error, Result, TRACING_TARGET_NOTIFICATION};

/// What a publication event means for the export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Update,
    Delete,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Update => write!(f, "UPDATE"),
            EventType::Delete => write!(f, "DELETE"),
        }
    }
}

/// One accepted publication event, ready for dispatch.
///
/// A notification only exists if the event survived the whole mapper filter
/// chain. Each one carries its own [`Terminator`] so shutdown can cancel the
/// delay of in-flight work.
#[derive(Debug, Clone)]
pub struct Notification {
    pub stub: Stub,
    pub ev_type: EventType,
    pub tid: String,
    pub terminator: Terminator,
}

/// Applies one notification to the object store.
///
/// UPDATE events wait out a configured delay first, absorbing publication
/// races where the enriched payload is not yet readable; the wait aborts
/// promptly when the notification's quit signal fires.
pub struct NotificationHandler {
    exporter: Arc<Exporter>,
    delay: Duration,
}

impl NotificationHandler {
    pub fn new(exporter: Arc<Exporter>, delay: Duration) -> Self {
        Self { exporter, delay }
    }

    pub async fn handle(&self, notification: &Notification) -> Result<()> {
        match notification.ev_type {
            EventType::Update => {
                tracing::info!(
                    target: TRACING_TARGET_NOTIFICATION,
                    tid = %notification.tid,
                    uuid = %notification.stub.uuid,
                    delay_secs = self.delay.as_secs(),
                    "UPDATE event received, waiting configured delay"
                );

                tokio::select! {
                    () = tokio::time::sleep(self.delay) => {}
                    () = notification.terminator.on_quit() => {
                        return Err(Error::DelayInterrupted);
                    }
                }

                self.exporter
                    .export(&notification.tid, &notification.stub)
                    .await
                    .map_err(Error::Update)
            }
            EventType::Delete => {
                tracing::info!(
                    target: TRACING_TARGET_NOTIFICATION,
                    tid = %notification.tid,
                    uuid = %notification.stub.uuid,
                    "DELETE event received"
                );

                match self
                    .exporter
                    .delete(&notification.stub.uuid, &notification.tid)
                    .await
                {
                    Ok(()) => Ok(()),
                    Err(err @ synd_engine::Error::NotFound { .. }) => {
                        // Repeated deletes are expected; the record is gone.
                        tracing::warn!(
                            target: TRACING_TARGET_NOTIFICATION,
                            tid = %notification.tid,
                            uuid = %notification.stub.uuid,
                            error = %err,
                            "Content already absent from store"
                        );
                        Ok(())
                    }
                    Err(err) => Err(Error::Delete(err)),
                }
            }
        }
    }
}
