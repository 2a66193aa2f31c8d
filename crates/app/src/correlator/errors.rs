//! Correlator errors.

use thiserror::Error;

use crate::{
    bus::BusError,
    domain::orders::models::CredentialType,
    signing::{AssociatedDataError, CodecError},
};

#[derive(Debug, Error)]
pub enum CorrelatorError {
    #[error("failed to decode signing result")]
    Codec(#[from] CodecError),

    #[error("bus error")]
    Bus(#[from] BusError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),
}

impl CorrelatorError {
    /// Configuration problems that no amount of retrying will fix.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Codec(CodecError::MissingCodec(_) | CodecError::WrongSchema { .. })
        )
    }

    /// The message itself cannot be decoded and should be set aside.
    #[must_use]
    pub fn is_poison(&self) -> bool {
        matches!(
            self,
            Self::Codec(CodecError::Avro(_) | CodecError::InvalidField(_))
        )
    }
}

/// Why one signed entry could not be stored.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("undecodable associated data")]
    AssociatedData(#[from] AssociatedDataError),

    #[error("signer rejected the issuer")]
    InvalidIssuer,

    #[error("signer failed to sign the entry")]
    Signer,

    #[error("no credential request recorded for the item")]
    UnknownCredential,

    #[error("signed entry carries no interval")]
    MissingInterval,

    #[error("invalid interval bound {0:?}")]
    InvalidInterval(String),

    #[error("result request id {0:?} is not a valid id")]
    InvalidRequestId(String),

    #[error("credential type {0} is not signed by the blind signer")]
    Unsupported(CredentialType),
}
