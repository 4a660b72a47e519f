#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

/// Tracing target for stream consumer operations.
pub const TRACING_TARGET_CONSUMER: &str = "synd_stream::consumer";

/// Tracing target for the listener state machine.
pub const TRACING_TARGET_LISTENER: &str = "synd_stream::listener";

/// Tracing target for notification handling.
pub const TRACING_TARGET_NOTIFICATION: &str = "synd_stream::notification";

mod config;
mod consumer;
mod error;
mod listener;
mod mapper;
mod notification;
mod policy;

pub use config::StreamConfig;
pub use consumer::{PublicationConsumer, PublicationMessage, TRANSACTION_ID_HEADER};
pub use error::{Error, Result};
pub use listener::Listener;
pub use mapper::{FilterError, MapError, MessageMapper};
pub use notification::{EventType, Notification, NotificationHandler};
pub use policy::{ContentPolicyResult, PolicyAgent};
