//! Credentials service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{credentials::plan::PlanError, orders::models::CredentialType},
    intervals::IntervalError,
};

#[derive(Debug, Error)]
pub enum CredentialsServiceError {
    #[error("credentials already submitted for this item")]
    AlreadyExists,

    #[error("order or item not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("order is not paid")]
    OrderNotPaid,

    #[error("credential type {0} is not supported")]
    UnsupportedCredentialType(CredentialType),

    #[error("invalid signing request")]
    Plan(#[source] PlanError),

    #[error("invalid credential interval")]
    Interval(#[from] IntervalError),
}

impl From<PlanError> for CredentialsServiceError {
    fn from(error: PlanError) -> Self {
        match error {
            PlanError::Unsupported(credential_type) => {
                Self::UnsupportedCredentialType(credential_type)
            }
            other => Self::Plan(other),
        }
    }
}

impl From<Error> for CredentialsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
