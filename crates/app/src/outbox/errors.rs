//! Outbox errors.

use thiserror::Error;

use crate::{bus::BusError, signing::CodecError};

#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("storage error")]
    Sql(#[from] sqlx::Error),

    #[error("failed to encode signing request")]
    Codec(#[from] CodecError),

    #[error("failed to publish signing request")]
    Bus(#[from] BusError),
}

impl OutboxError {
    /// Errors that will not clear up by retrying the same batch.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Codec(_))
    }
}
