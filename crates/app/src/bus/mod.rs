//! Message bus between this service and the blind signer.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

pub mod memory;
pub mod rest_proxy;

pub use memory::{MemoryBus, MemoryReader, MemoryWriter};
pub use rest_proxy::{RestProxyConfig, RestProxyReader, RestProxyWriter};

/// Default topic carrying signing requests to the signer.
pub const DEFAULT_SIGNING_REQUESTS_TOPIC: &str = "request.v1";

/// Default topic carrying signed results back from the signer.
pub const DEFAULT_SIGNING_RESULTS_TOPIC: &str = "result.v1";

/// Default consumer group for the result reader.
pub const DEFAULT_CONSUMER_GROUP: &str = "skus-signing-results";

/// Topic names and consumer group, passed explicitly to every bus user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusTopics {
    pub signing_requests: String,
    pub signing_results: String,
    pub dead_letters: Option<String>,
    pub consumer_group: String,
}

impl Default for BusTopics {
    fn default() -> Self {
        Self {
            signing_requests: DEFAULT_SIGNING_REQUESTS_TOPIC.to_string(),
            signing_results: DEFAULT_SIGNING_RESULTS_TOPIC.to_string(),
            dead_letters: None,
            consumer_group: DEFAULT_CONSUMER_GROUP.to_string(),
        }
    }
}

/// Message read from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

/// Message to be written to a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum BusError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from bus: {0}")]
    UnexpectedResponse(String),

    #[error("record payload is not valid base64")]
    Payload(#[from] base64::DecodeError),

    #[error("topic {0:?} is closed")]
    Closed(String),
}

#[automock]
#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Write one message, returning once the bus has acknowledged it.
    async fn write(&self, message: OutgoingMessage) -> Result<(), BusError>;
}

#[automock]
#[async_trait]
pub trait MessageReader: Send + Sync {
    /// Wait for the next message on the subscribed topic.
    async fn read(&self) -> Result<Message, BusError>;

    /// Mark `message` and everything before it on its partition as handled.
    async fn commit(&self, message: &Message) -> Result<(), BusError>;
}
