//! Outbox Models

use jiff::Timestamp;

use crate::{
    domain::orders::models::{OrderItemUuid, OrderUuid},
    signing::{RequestUuid, SigningOrderRequest},
    uuids::TypedUuid,
};

/// Outbox Entry UUID
pub type OutboxEntryUuid = TypedUuid<OutboxEntry>;

/// A signing request waiting for, or past, publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: OutboxEntryUuid,
    pub order_id: OrderUuid,
    pub item_id: OrderItemUuid,
    pub request_id: RequestUuid,
    pub message: SigningOrderRequest,
    pub created_at: Timestamp,
    /// Set once the request has been accepted by the bus.
    pub processed_at: Option<Timestamp>,
    /// Set once signed results for the request have been stored.
    pub completed_at: Option<Timestamp>,
}

impl OutboxEntry {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// New Outbox Entry Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxEntry {
    pub order_id: OrderUuid,
    pub item_id: OrderItemUuid,
    pub message: SigningOrderRequest,
}
