//! Orders

pub mod derivation;
pub mod errors;
pub mod models;
mod repositories;
pub mod service;

pub(crate) use repositories::{PgOrderItemsRepository, PgOrdersRepository};

pub use errors::OrdersServiceError;
pub use service::*;
