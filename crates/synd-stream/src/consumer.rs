//! NATS JetStream transport for publication events.

use async_nats::jetstream::{self, consumer, stream};
use bytes::Bytes;

use crate::{Error, Result, StreamConfig, TRACING_TARGET_CONSUMER};

/// Header carrying the transaction identifier on every publication event.
pub const TRANSACTION_ID_HEADER: &str = "X-Request-Id";

/// How long the broker waits for an acknowledgement before redelivering.
const ACK_WAIT: std::time::Duration = std::time::Duration::from_secs(300);

/// Maximum redeliveries of an unacknowledged event.
const MAX_DELIVER: i64 = 3;

/// One decoded-from-transport publication event: the transaction id from the
/// `X-Request-Id` header plus the raw JSON envelope.
#[derive(Debug, Clone)]
pub struct PublicationMessage {
    pub tid: String,
    pub body: Bytes,
}

impl PublicationMessage {
    pub fn new(tid: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            tid: tid.into(),
            body: body.into(),
        }
    }
}

impl From<&jetstream::Message> for PublicationMessage {
    fn from(message: &jetstream::Message) -> Self {
        let tid = message
            .headers
            .as_ref()
            .and_then(|headers| headers.get(TRANSACTION_ID_HEADER))
            .map(|value| value.as_str().to_string())
            .unwrap_or_default();
        Self {
            tid,
            body: message.payload.clone(),
        }
    }
}

/// Pull consumer over the publication-event stream.
#[derive(Clone)]
pub struct PublicationConsumer {
    client: async_nats::Client,
    consumer: consumer::PullConsumer,
}

impl PublicationConsumer {
    /// Connects to NATS and ensures the stream and durable consumer exist.
    pub async fn connect(config: &StreamConfig) -> Result<Self> {
        let client = async_nats::connect(config.nats_url.as_str()).await?;
        let jetstream = jetstream::new(client.clone());

        let stream_config = stream::Config {
            name: config.stream_name.clone(),
            description: Some("Publication events for incremental content export".to_string()),
            subjects: vec![format!("{}.>", config.subject)],
            ..Default::default()
        };

        let stream = match jetstream.get_stream(&config.stream_name).await {
            Ok(stream) => {
                tracing::debug!(
                    target: TRACING_TARGET_CONSUMER,
                    stream = %config.stream_name,
                    "Using existing publication stream"
                );
                stream
            }
            Err(_) => {
                tracing::debug!(
                    target: TRACING_TARGET_CONSUMER,
                    stream = %config.stream_name,
                    "Creating publication stream"
                );
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|err| Error::consumer(err.to_string()))?
            }
        };

        let consumer_config = consumer::pull::Config {
            name: Some(config.consumer_group.clone()),
            durable_name: Some(config.consumer_group.clone()),
            description: Some("synd content exporter".to_string()),
            ack_wait: ACK_WAIT,
            max_deliver: MAX_DELIVER,
            ..Default::default()
        };

        let consumer = stream
            .create_consumer(consumer_config)
            .await
            .map_err(|err| Error::consumer(err.to_string()))?;

        tracing::info!(
            target: TRACING_TARGET_CONSUMER,
            stream = %config.stream_name,
            consumer = %config.consumer_group,
            "Publication consumer ready"
        );

        Ok(Self { client, consumer })
    }

    /// Returns the live message stream. Messages must be acknowledged by the
    /// caller once handled.
    pub async fn messages(&self) -> Result<consumer::pull::Stream> {
        self.consumer
            .messages()
            .await
            .map_err(|err| Error::consumer(err.to_string()))
    }

    /// Reports broker connectivity for the health surface.
    pub fn connectivity_check(&self) -> Result<String, synd_core::BoxedError> {
        match self.client.connection_state() {
            async_nats::connection::State::Connected => {
                Ok("Connectivity to the event stream is OK".to_string())
            }
            state => Err(format!("event stream connection is {state}").into()),
        }
    }

    /// Drains the connection; in-flight published data is flushed first.
    pub async fn close(&self) {
        if let Err(err) = self.client.drain().await {
            tracing::error!(
                target: TRACING_TARGET_CONSUMER,
                error = %err,
                "Error closing consumer"
            );
        }
    }
}
