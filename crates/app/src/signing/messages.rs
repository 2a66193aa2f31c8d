//! Signing request and result messages exchanged with the blind signer.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::uuids::TypedUuid;

/// Signing Request UUID
pub type RequestUuid = TypedUuid<SigningOrderRequest>;

/// Batch of signing orders sent to the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningOrderRequest {
    pub request_id: RequestUuid,
    pub data: Vec<SigningOrder>,
}

/// Blinded tokens to be signed by one issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningOrder {
    #[serde(with = "base64_bytes")]
    pub associated_data: Vec<u8>,
    pub blinded_tokens: Vec<String>,
    pub issuer_type: String,
    pub issuer_cohort: i16,
}

/// Batch of signed results returned by the signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningOrderResult {
    pub request_id: String,
    pub data: Vec<SignedOrder>,
}

/// Per-entry outcome reported by the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignedOrderStatus {
    Ok,
    InvalidIssuer,
    Error,
}

impl SignedOrderStatus {
    /// Symbols in schema order.
    pub const SYMBOLS: [&'static str; 3] = ["ok", "invalid_issuer", "error"];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::InvalidIssuer => "invalid_issuer",
            Self::Error => "error",
        }
    }

    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::Ok => 0,
            Self::InvalidIssuer => 1,
            Self::Error => 2,
        }
    }
}

impl fmt::Display for SignedOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignedOrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ok" => Ok(Self::Ok),
            "invalid_issuer" => Ok(Self::InvalidIssuer),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown signing status {other:?}")),
        }
    }
}

/// One signed batch, correlated back through its associated data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    pub signed_tokens: Vec<String>,
    pub public_key: String,
    pub proof: String,
    pub status: SignedOrderStatus,
    #[serde(with = "base64_bytes")]
    pub associated_data: Vec<u8>,
    #[serde(default)]
    pub valid_to: Option<String>,
    #[serde(default)]
    pub valid_from: Option<String>,
    #[serde(default)]
    pub blinded_tokens: Vec<String>,
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;

        STANDARD.decode(encoded).map_err(D::Error::custom)
    }
}
