//! Associated data carried through the signer to correlate results.
//!
//! Encoded as a JSON object whose key names match what the signer already
//! echoes back (`orderId`, `itemId`, `issuerId`, `credential_type`), plus a
//! `version` and the interval bounds for time-limited-v2 entries. Payloads
//! without a `version` are version 1.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{
        issuers::models::IssuerUuid,
        orders::models::{CredentialType, OrderItemUuid, OrderUuid},
    },
    intervals::Window,
};

/// Current associated-data layout version.
pub const ASSOCIATED_DATA_VERSION: u8 = 1;

#[derive(Debug, Error)]
pub enum AssociatedDataError {
    #[error("associated data is not valid")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported associated data version {0}")]
    UnsupportedVersion(u8),

    #[error("interval bounds are incomplete or inverted")]
    InvalidInterval,
}

/// Correlation key for one signing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociatedData {
    pub order_id: OrderUuid,
    pub item_id: OrderItemUuid,
    pub issuer_id: IssuerUuid,
    pub credential_type: CredentialType,
    pub interval: Option<Window>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Wire {
    #[serde(default = "legacy_version")]
    version: u8,
    #[serde(rename = "orderId")]
    order_id: OrderUuid,
    #[serde(rename = "itemId")]
    item_id: OrderItemUuid,
    #[serde(rename = "issuerId")]
    issuer_id: IssuerUuid,
    credential_type: CredentialType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_from: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_to: Option<Timestamp>,
}

const fn legacy_version() -> u8 {
    1
}

impl AssociatedData {
    /// Encode to the opaque bytes placed on a signing order.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, AssociatedDataError> {
        let wire = Wire {
            version: ASSOCIATED_DATA_VERSION,
            order_id: self.order_id,
            item_id: self.item_id,
            issuer_id: self.issuer_id,
            credential_type: self.credential_type,
            valid_from: self.interval.map(|w| w.valid_from),
            valid_to: self.interval.map(|w| w.valid_to),
        };

        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decode the opaque bytes echoed back on a signed order.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed payloads, unknown versions, or
    /// partial interval bounds.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssociatedDataError> {
        let wire: Wire = serde_json::from_slice(bytes)?;

        if wire.version != ASSOCIATED_DATA_VERSION {
            return Err(AssociatedDataError::UnsupportedVersion(wire.version));
        }

        let interval = match (wire.valid_from, wire.valid_to) {
            (Some(valid_from), Some(valid_to)) if valid_from < valid_to => Some(Window {
                valid_from,
                valid_to,
            }),
            (None, None) => None,
            _ => return Err(AssociatedDataError::InvalidInterval),
        };

        Ok(Self {
            order_id: wire.order_id,
            item_id: wire.item_id,
            issuer_id: wire.issuer_id,
            credential_type: wire.credential_type,
            interval,
        })
    }
}
