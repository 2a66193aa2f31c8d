//! Signing Request Outbox
//!
//! Signing requests are written to `signing_order_request_outbox` in the
//! same transaction as the state change that produced them, then drained to
//! the bus by [`OutboxPublisher`]. Delivery is at least once.

pub mod errors;
pub mod models;
pub mod publisher;
pub(crate) mod repository;

pub use errors::OutboxError;
pub use publisher::{OutboxPublisher, PublishReport};
pub(crate) use repository::PgOutboxRepository;
