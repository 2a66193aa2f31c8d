//! Credentials

pub mod dedupe;
pub mod errors;
pub mod models;
pub mod plan;
mod repositories;
pub mod service;

pub(crate) use repositories::{
    PgSingleUseCredentialsRepository, PgTimeLimitedV2CredentialsRepository,
};

pub use errors::CredentialsServiceError;
pub use models::{CredentialState, Credentials};
pub use service::*;
