//! Credential Models

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{
        issuers::models::IssuerUuid,
        orders::models::{OrderItemUuid, OrderUuid},
    },
    signing::RequestUuid,
    uuids::TypedUuid,
};

/// Time-limited-v2 credential row UUID
pub type TimeLimitedV2CredentialUuid = TypedUuid<TimeLimitedV2Credential>;

/// Blinded tokens submitted for a single-use item, signed at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingleUseCredential {
    pub item_id: OrderItemUuid,
    pub order_id: OrderUuid,
    pub issuer_id: IssuerUuid,
    pub blinded_creds: Vec<String>,
    pub signed_creds: Option<Vec<String>>,
    pub batch_proof: Option<String>,
    pub public_key: Option<String>,
    #[serde(skip)]
    pub created_at: Timestamp,
}

impl SingleUseCredential {
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed_creds.is_some()
    }
}

/// Signed credentials for one interval of a time-limited-v2 item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeLimitedV2Credential {
    #[serde(skip)]
    pub id: TimeLimitedV2CredentialUuid,
    pub item_id: OrderItemUuid,
    pub order_id: OrderUuid,
    pub issuer_id: IssuerUuid,
    #[serde(skip)]
    pub request_id: RequestUuid,
    pub blinded_creds: Vec<String>,
    pub signed_creds: Vec<String>,
    pub batch_proof: String,
    pub public_key: String,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
    #[serde(skip)]
    pub created_at: Timestamp,
}

/// Row to store for one signed time-limited-v2 interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeLimitedV2Credential {
    pub item_id: OrderItemUuid,
    pub order_id: OrderUuid,
    pub issuer_id: IssuerUuid,
    pub request_id: RequestUuid,
    pub blinded_creds: Vec<String>,
    pub signed_creds: Vec<String>,
    pub batch_proof: String,
    pub public_key: String,
    pub valid_from: Timestamp,
    pub valid_to: Timestamp,
}

/// Signed material for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "credentials", rename_all = "kebab-case")]
pub enum Credentials {
    SingleUse(SingleUseCredential),
    TimeLimitedV2(Vec<TimeLimitedV2Credential>),
}

/// What a poller should do next for an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    /// Nothing was ever submitted for signing.
    Absent,

    /// Signing is in flight; poll again after the hint.
    Pending { retry_after_seconds: u64 },

    Ready(Credentials),
}
