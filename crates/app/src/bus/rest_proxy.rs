//! Kafka REST Proxy (v2) client using the binary embedded format.

use std::{collections::VecDeque, time::Duration};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::sleep};
use tracing::debug;
use uuid::Uuid;

use crate::bus::{BusError, Message, MessageReader, MessageWriter, OutgoingMessage};

const BINARY_V2: &str = "application/vnd.kafka.binary.v2+json";
const V2_JSON: &str = "application/vnd.kafka.v2+json";

/// Connection settings for a REST proxy.
#[derive(Debug, Clone)]
pub struct RestProxyConfig {
    /// Proxy address, e.g. `"http://localhost:8082"`.
    pub url: String,

    /// How long to wait before fetching again after an empty fetch.
    pub poll_interval: Duration,
}

impl RestProxyConfig {
    fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response, BusError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    Err(BusError::UnexpectedResponse(format!(
        "{action} failed with status {status}: {text}"
    )))
}

#[derive(Debug, Serialize)]
struct ProduceRequest {
    records: Vec<ProduceRecord>,
}

#[derive(Debug, Serialize)]
struct ProduceRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    value: String,
}

#[derive(Debug, Deserialize)]
struct ProduceResponse {
    offsets: Vec<ProduceOffset>,
}

#[derive(Debug, Deserialize)]
struct ProduceOffset {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

/// Produces messages through the proxy.
#[derive(Debug, Clone)]
pub struct RestProxyWriter {
    config: RestProxyConfig,
    http: Client,
}

impl RestProxyWriter {
    #[must_use]
    pub fn new(config: RestProxyConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }
}

#[async_trait]
impl MessageWriter for RestProxyWriter {
    async fn write(&self, message: OutgoingMessage) -> Result<(), BusError> {
        let url = format!("{}/topics/{}", self.config.base_url(), message.topic);

        let body = ProduceRequest {
            records: vec![ProduceRecord {
                key: message.key.as_deref().map(|key| BASE64.encode(key)),
                value: BASE64.encode(&message.payload),
            }],
        };

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, BINARY_V2)
            .header(reqwest::header::ACCEPT, V2_JSON)
            .json(&body)
            .send()
            .await?;

        let parsed: ProduceResponse = ensure_success(response, "produce").await?.json().await?;

        if let Some(failed) = parsed
            .offsets
            .iter()
            .find(|offset| offset.error_code.is_some() || offset.error.is_some())
        {
            return Err(BusError::UnexpectedResponse(format!(
                "produce to {} rejected: {}",
                message.topic,
                failed.error.as_deref().unwrap_or("unknown error")
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CreateConsumer<'a> {
    name: &'a str,
    format: &'static str,
    #[serde(rename = "auto.offset.reset")]
    auto_offset_reset: &'static str,
    #[serde(rename = "auto.commit.enable")]
    auto_commit_enable: &'static str,
}

#[derive(Debug, Deserialize)]
struct ConsumerInstance {
    base_uri: String,
}

#[derive(Debug, Serialize)]
struct Subscription<'a> {
    topics: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct Record {
    topic: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
    partition: i32,
    offset: i64,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    offsets: [CommitOffset<'a>; 1],
}

#[derive(Debug, Serialize)]
struct CommitOffset<'a> {
    topic: &'a str,
    partition: i32,
    offset: i64,
}

/// Consumes one topic through a proxy consumer instance. Offsets are only
/// committed explicitly.
#[derive(Debug)]
pub struct RestProxyReader {
    config: RestProxyConfig,
    http: Client,
    base_uri: String,
    buffered: Mutex<VecDeque<Message>>,
}

impl RestProxyReader {
    /// Create a consumer instance in `group` and subscribe it to `topic`.
    ///
    /// # Errors
    ///
    /// Returns an error when the proxy rejects either request.
    pub async fn subscribe(
        config: RestProxyConfig,
        group: &str,
        topic: &str,
    ) -> Result<Self, BusError> {
        let http = Client::new();
        let name = format!("{group}-{}", Uuid::now_v7().simple());

        let response = http
            .post(format!("{}/consumers/{group}", config.base_url()))
            .header(reqwest::header::CONTENT_TYPE, V2_JSON)
            .json(&CreateConsumer {
                name: &name,
                format: "binary",
                auto_offset_reset: "earliest",
                auto_commit_enable: "false",
            })
            .send()
            .await?;

        let instance: ConsumerInstance = ensure_success(response, "create consumer")
            .await?
            .json()
            .await?;

        let response = http
            .post(format!("{}/subscription", instance.base_uri))
            .header(reqwest::header::CONTENT_TYPE, V2_JSON)
            .json(&Subscription { topics: [topic] })
            .send()
            .await?;

        ensure_success(response, "subscribe").await?;

        debug!(group, topic, consumer = %name, "subscribed to topic");

        Ok(Self {
            config,
            http,
            base_uri: instance.base_uri,
            buffered: Mutex::new(VecDeque::new()),
        })
    }

    async fn fetch(&self) -> Result<Vec<Message>, BusError> {
        let response = self
            .http
            .get(format!("{}/records", self.base_uri))
            .header(reqwest::header::ACCEPT, BINARY_V2)
            .send()
            .await?;

        let records: Vec<Record> = ensure_success(response, "fetch").await?.json().await?;

        records
            .into_iter()
            .map(|record| {
                Ok(Message {
                    topic: record.topic,
                    partition: record.partition,
                    offset: record.offset,
                    key: record.key.map(|key| BASE64.decode(key)).transpose()?,
                    payload: BASE64.decode(record.value.unwrap_or_default())?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MessageReader for RestProxyReader {
    async fn read(&self) -> Result<Message, BusError> {
        let mut buffered = self.buffered.lock().await;

        loop {
            if let Some(message) = buffered.pop_front() {
                return Ok(message);
            }

            let fetched = self.fetch().await?;

            if fetched.is_empty() {
                sleep(self.config.poll_interval).await;
            }

            buffered.extend(fetched);
        }
    }

    async fn commit(&self, message: &Message) -> Result<(), BusError> {
        let response = self
            .http
            .post(format!("{}/offsets", self.base_uri))
            .header(reqwest::header::CONTENT_TYPE, V2_JSON)
            .json(&CommitRequest {
                offsets: [CommitOffset {
                    topic: &message.topic,
                    partition: message.partition,
                    offset: message.offset,
                }],
            })
            .send()
            .await?;

        ensure_success(response, "commit").await?;

        Ok(())
    }
}
