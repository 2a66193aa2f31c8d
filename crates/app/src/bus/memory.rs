//! In-process bus over tokio channels.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::{
    Mutex as AsyncMutex,
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::bus::{BusError, Message, MessageReader, MessageWriter, OutgoingMessage};

#[derive(Debug)]
struct Topic {
    sender: UnboundedSender<Message>,
    receiver: Option<UnboundedReceiver<Message>>,
    next_offset: i64,
    committed: Option<i64>,
}

impl Topic {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            sender,
            receiver: Some(receiver),
            next_offset: 0,
            committed: None,
        }
    }
}

type Topics = Arc<Mutex<FxHashMap<String, Topic>>>;

/// Bus with one single-partition queue per topic. Each topic supports one
/// reader.
#[derive(Debug, Clone, Default)]
pub struct MemoryBus {
    topics: Topics,
}

impl MemoryBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn writer(&self) -> MemoryWriter {
        MemoryWriter {
            topics: Arc::clone(&self.topics),
        }
    }

    /// Subscribe to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Closed`] when the topic already has a reader.
    pub fn reader(&self, topic: &str) -> Result<MemoryReader, BusError> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);

        let receiver = topics
            .entry(topic.to_string())
            .or_insert_with(Topic::new)
            .receiver
            .take()
            .ok_or_else(|| BusError::Closed(topic.to_string()))?;

        Ok(MemoryReader {
            topic: topic.to_string(),
            topics: Arc::clone(&self.topics),
            receiver: AsyncMutex::new(receiver),
        })
    }

    /// Highest offset committed on `topic`.
    #[must_use]
    pub fn committed_offset(&self, topic: &str) -> Option<i64> {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .and_then(|topic| topic.committed)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryWriter {
    topics: Topics,
}

#[async_trait]
impl MessageWriter for MemoryWriter {
    async fn write(&self, message: OutgoingMessage) -> Result<(), BusError> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);
        let topic = topics
            .entry(message.topic.clone())
            .or_insert_with(Topic::new);

        let offset = topic.next_offset;
        topic.next_offset += 1;

        topic
            .sender
            .send(Message {
                topic: message.topic,
                partition: 0,
                offset,
                key: message.key,
                payload: message.payload,
            })
            .map_err(|error| BusError::Closed(error.0.topic))
    }
}

#[derive(Debug)]
pub struct MemoryReader {
    topic: String,
    topics: Topics,
    receiver: AsyncMutex<UnboundedReceiver<Message>>,
}

impl MemoryReader {
    /// Take every message currently queued without waiting.
    pub async fn drain(&self) -> Vec<Message> {
        let mut receiver = self.receiver.lock().await;
        let mut messages = Vec::new();

        while let Ok(message) = receiver.try_recv() {
            messages.push(message);
        }

        messages
    }
}

#[async_trait]
impl MessageReader for MemoryReader {
    async fn read(&self) -> Result<Message, BusError> {
        self.receiver
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| BusError::Closed(self.topic.clone()))
    }

    async fn commit(&self, message: &Message) -> Result<(), BusError> {
        let mut topics = self.topics.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(topic) = topics.get_mut(&message.topic) {
            topic.committed = topic.committed.max(Some(message.offset));
        }

        Ok(())
    }
}
