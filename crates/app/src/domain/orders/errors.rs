//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{credentials::plan::PlanError, orders::derivation::DerivationError},
    intervals::IntervalError,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),

    #[error("order has no items")]
    EmptyOrder,

    #[error("order items use different currencies")]
    MixedCurrencies,

    #[error("order items belong to different merchants")]
    MixedLocations,

    #[error("order total overflows")]
    TotalOverflow,

    #[error("invalid order item")]
    Derivation(#[from] DerivationError),

    #[error("invalid credential interval")]
    Interval(#[from] IntervalError),

    #[error("failed to plan signing request")]
    Plan(#[from] PlanError),
}

impl From<Error> for OrdersServiceError {
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
