//! Argument groups shared between commands

use std::time::Duration;

use clap::{Args, ValueEnum};
use skus_app::bus::{
    BusTopics, DEFAULT_CONSUMER_GROUP, DEFAULT_SIGNING_REQUESTS_TOPIC,
    DEFAULT_SIGNING_RESULTS_TOPIC, RestProxyConfig,
};

/// Log output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

#[derive(Debug, Args)]
pub(crate) struct LoggingArgs {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub(crate) log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub(crate) log_format: LogFormat,
}

#[derive(Debug, Args)]
pub(crate) struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub(crate) database_url: String,
}

#[derive(Debug, Args)]
pub(crate) struct BusArgs {
    /// Kafka REST proxy address
    #[arg(long, env = "KAFKA_REST_PROXY_URL", default_value = "http://localhost:8082")]
    pub(crate) rest_proxy_url: String,

    /// Topic signing requests are published to
    #[arg(long, env = "GRANT_CBP_SIGN_CONSUMER_TOPIC", default_value = DEFAULT_SIGNING_REQUESTS_TOPIC)]
    pub(crate) request_topic: String,

    /// Topic signing results are consumed from
    #[arg(long, env = "GRANT_CBP_SIGN_PRODUCER_TOPIC", default_value = DEFAULT_SIGNING_RESULTS_TOPIC)]
    pub(crate) result_topic: String,

    /// Topic receiving undecodable or failed results
    #[arg(long, env = "GRANT_CBP_SIGN_CONSUMER_TOPIC_DLQ")]
    pub(crate) dead_letter_topic: Option<String>,

    /// Consumer group for the result topic
    #[arg(long, env = "KAFKA_CONSUMER_GROUP", default_value = DEFAULT_CONSUMER_GROUP)]
    pub(crate) consumer_group: String,

    /// Milliseconds to wait after an empty poll
    #[arg(long, env = "WORKER_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub(crate) poll_interval_ms: u64,
}

impl BusArgs {
    pub(crate) fn topics(&self) -> BusTopics {
        BusTopics {
            signing_requests: self.request_topic.clone(),
            signing_results: self.result_topic.clone(),
            dead_letters: self
                .dead_letter_topic
                .clone()
                .filter(|topic| !topic.trim().is_empty()),
            consumer_group: self.consumer_group.clone(),
        }
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub(crate) fn rest_proxy(&self) -> RestProxyConfig {
        RestProxyConfig {
            url: self.rest_proxy_url.clone(),
            poll_interval: self.poll_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        bus: BusArgs,
    }

    #[test]
    fn blank_dead_letter_topic_is_disabled() {
        let harness = Harness::parse_from(["test", "--dead-letter-topic", " "]);

        assert_eq!(harness.bus.topics().dead_letters, None);
    }

    #[test]
    fn topics_default_to_signer_names() {
        let harness = Harness::parse_from(["test"]);
        let topics = harness.bus.topics();

        assert_eq!(topics.signing_requests, DEFAULT_SIGNING_REQUESTS_TOPIC);
        assert_eq!(topics.signing_results, DEFAULT_SIGNING_RESULTS_TOPIC);
        assert_eq!(topics.consumer_group, DEFAULT_CONSUMER_GROUP);
    }
}
