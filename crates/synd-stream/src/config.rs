//! Stream transport and listener configuration.

use std::time::Duration;

use clap::Args;

/// Configuration for the publication-event stream and the listener built on
/// top of it. All options can be supplied as CLI flags or environment
/// variables.
#[derive(Debug, Clone, Args)]
pub struct StreamConfig {
    /// NATS server URL (comma-separated for clustering).
    #[arg(
        long = "nats-url",
        env = "NATS_URL",
        default_value = "nats://localhost:4222"
    )]
    pub nats_url: String,

    /// JetStream stream holding publication events.
    #[arg(
        long = "nats-stream",
        env = "NATS_STREAM",
        default_value = "PUBLICATION_EVENTS"
    )]
    pub stream_name: String,

    /// Subject publication events are published on.
    #[arg(
        long = "nats-subject",
        env = "NATS_SUBJECT",
        default_value = "publication.events"
    )]
    pub subject: String,

    /// Durable consumer name; doubles as the consumer group identity.
    #[arg(
        long = "consumer-group",
        env = "CONSUMER_GROUP",
        default_value = "synd-content-exporter"
    )]
    pub consumer_group: String,

    /// Maximum number of notifications handled concurrently.
    #[arg(long = "max-concurrency", env = "MAX_CONCURRENCY", default_value_t = 100)]
    pub max_concurrency: usize,

    /// Seconds to wait before exporting an UPDATE, absorbing publication
    /// races where enriched content is not yet available.
    #[arg(
        long = "delay-for-notification",
        env = "DELAY_FOR_NOTIFICATION",
        default_value_t = 30
    )]
    pub delay_for_notification: u64,
}

impl StreamConfig {
    /// Returns the notification delay as a [`Duration`].
    #[inline]
    pub fn notification_delay(&self) -> Duration {
        Duration::from_secs(self.delay_for_notification)
    }

    /// Returns the server URLs as a vector (splits comma-separated URLs).
    pub fn servers(&self) -> Vec<&str> {
        self.nats_url.split(',').map(str::trim).collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[clap(flatten)]
        stream: StreamConfig,
    }

    #[test]
    fn defaults_match_service_expectations() {
        let cli = TestCli::parse_from(["test"]);
        assert_eq!(cli.stream.stream_name, "PUBLICATION_EVENTS");
        assert_eq!(cli.stream.max_concurrency, 100);
        assert_eq!(cli.stream.notification_delay(), Duration::from_secs(30));
    }

    #[test]
    fn splits_clustered_urls() {
        let cli = TestCli::parse_from([
            "test",
            "--nats-url",
            "nats://a:4222, nats://b:4222",
        ]);
        assert_eq!(cli.stream.servers(), vec!["nats://a:4222", "nats://b:4222"]);
    }
}
