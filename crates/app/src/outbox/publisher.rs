//! Outbox publisher.

use std::{sync::Arc, time::Duration};

use jiff::Timestamp;
use tokio::{sync::watch, time::sleep};
use tracing::{error, info, warn};

use crate::{
    bus::{MessageWriter, OutgoingMessage},
    database::Db,
    outbox::{errors::OutboxError, repository::PgOutboxRepository},
    signing::CodecRegistry,
};

/// Outcome of one publisher pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Entries published and marked processed.
    pub published: usize,

    /// Entries selected but left unprocessed after a publish failure.
    pub deferred: usize,
}

/// Drains unprocessed outbox entries onto the signing request topic.
#[derive(Clone)]
pub struct OutboxPublisher {
    db: Db,
    repository: PgOutboxRepository,
    writer: Arc<dyn MessageWriter>,
    codecs: Arc<CodecRegistry>,
    topic: String,
    batch_size: u32,
}

impl OutboxPublisher {
    #[must_use]
    pub fn new(
        db: Db,
        writer: Arc<dyn MessageWriter>,
        codecs: Arc<CodecRegistry>,
        topic: String,
        batch_size: u32,
    ) -> Self {
        Self {
            db,
            repository: PgOutboxRepository::new(),
            writer,
            codecs,
            topic,
            batch_size: batch_size.max(1),
        }
    }

    /// Publish up to one batch of the oldest unprocessed entries.
    ///
    /// Entries are marked processed only after the bus accepts them. The
    /// first publish failure ends the pass, leaving that entry and the rest
    /// of the batch for the next pass.
    ///
    /// # Errors
    ///
    /// Returns an error when storage fails or an entry cannot be encoded
    /// for the topic.
    pub async fn publish_next_batch(&self) -> Result<PublishReport, OutboxError> {
        let mut tx = self.db.begin().await?;

        let entries = self
            .repository
            .lock_unprocessed(&mut tx, self.batch_size)
            .await?;

        let mut report = PublishReport::default();

        for (index, entry) in entries.iter().enumerate() {
            let payload = match self.codecs.encode_request(&self.topic, &entry.message) {
                Ok(payload) => payload,
                Err(codec_error) => {
                    tx.commit().await?;

                    return Err(codec_error.into());
                }
            };

            let message = OutgoingMessage {
                topic: self.topic.clone(),
                key: Some(entry.request_id.to_string().into_bytes()),
                payload,
            };

            if let Err(bus_error) = self.writer.write(message).await {
                warn!(
                    request_id = %entry.request_id,
                    order_id = %entry.order_id,
                    error = %bus_error,
                    "failed to publish signing request, will retry"
                );

                report.deferred = entries.len() - index;

                break;
            }

            self.repository
                .mark_processed(&mut tx, entry.id, Timestamp::now())
                .await?;

            info!(
                request_id = %entry.request_id,
                order_id = %entry.order_id,
                item_id = %entry.item_id,
                topic = %self.topic,
                "published signing request"
            );

            report.published += 1;
        }

        tx.commit().await?;

        Ok(report)
    }

    /// Publish until `shutdown` flips to `true`, sleeping `poll_interval`
    /// whenever the outbox is drained or publishing failed.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error; transient failures are logged and
    /// retried.
    pub async fn run(
        &self,
        poll_interval: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), OutboxError> {
        info!(topic = %self.topic, batch_size = self.batch_size, "outbox publisher started");

        while !*shutdown.borrow() {
            let idle = match self.publish_next_batch().await {
                Ok(report) => report.published == 0 || report.deferred > 0,
                Err(fatal) if fatal.is_fatal() => {
                    error!(error = %fatal, "outbox publisher stopping on fatal error");

                    return Err(fatal);
                }
                Err(transient) => {
                    warn!(error = %transient, "outbox publisher pass failed");

                    true
                }
            };

            if idle {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    () = sleep(poll_interval) => {}
                }
            }
        }

        info!(topic = %self.topic, "outbox publisher stopped");

        Ok(())
    }
}
