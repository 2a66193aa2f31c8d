//! Order Models

use std::{fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    intervals::{CredentialPeriod, IntervalError},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// Default number of future intervals signed ahead of time.
pub const DEFAULT_ISSUER_BUFFER: u32 = 30;

/// Default number of trailing intervals still accepted after expiry.
pub const DEFAULT_ISSUER_OVERLAP: u32 = 5;

/// How credentials for an order item are issued and redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialType {
    #[serde(rename = "single-use")]
    SingleUse,

    #[serde(rename = "time-limited")]
    TimeLimited,

    #[serde(rename = "time-limited-v2")]
    TimeLimitedV2,
}

impl CredentialType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleUse => "single-use",
            Self::TimeLimited => "time-limited",
            Self::TimeLimitedV2 => "time-limited-v2",
        }
    }

    /// Whether credentials of this type are produced by the blind signer.
    #[must_use]
    pub const fn is_blind_signed(self) -> bool {
        matches!(self, Self::SingleUse | Self::TimeLimitedV2)
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised credential type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown credential type {0:?}")]
pub struct UnknownCredentialType(pub String);

impl FromStr for CredentialType {
    type Err = UnknownCredentialType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "single-use" => Ok(Self::SingleUse),
            "time-limited" => Ok(Self::TimeLimited),
            "time-limited-v2" => Ok(Self::TimeLimitedV2),
            other => Err(UnknownCredentialType(other.to_string())),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Canceled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "canceled" => Ok(Self::Canceled),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

/// Issuer key rotation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuerConfig {
    pub buffer: u32,
    pub overlap: u32,
}

impl IssuerConfig {
    #[must_use]
    pub const fn num_intervals(self) -> u32 {
        self.buffer.saturating_add(self.overlap)
    }
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_ISSUER_BUFFER,
            overlap: DEFAULT_ISSUER_OVERLAP,
        }
    }
}

/// Entitlement terms derived from a SKU token, before persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTerms {
    pub sku: String,
    pub credential_type: CredentialType,
    pub quantity: u32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub currency: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub valid_for: Option<SignedDuration>,
    pub valid_for_iso: Option<String>,
    pub each_credential_valid_for_iso: Option<String>,
    pub issuance_interval_iso: Option<String>,
    pub issuer_config: IssuerConfig,
    pub metadata: Map<String, Value>,
}

/// Order Item Model
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub id: OrderItemUuid,
    pub order_id: OrderUuid,
    pub sku: String,
    pub credential_type: CredentialType,
    pub quantity: u32,
    pub price: Decimal,
    pub subtotal: Decimal,
    pub currency: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub valid_for: Option<SignedDuration>,
    pub valid_for_iso: Option<String>,
    pub each_credential_valid_for_iso: Option<String>,
    pub issuance_interval_iso: Option<String>,
    pub issuer_config: IssuerConfig,
    pub metadata: Map<String, Value>,
    pub created_at: Timestamp,
}

impl OrderItem {
    /// Period each time-limited-v2 credential is valid for.
    ///
    /// # Errors
    ///
    /// Returns an error when the item has no per-credential duration or it
    /// is not day or month aligned.
    pub fn credential_period(&self) -> Result<CredentialPeriod, IntervalError> {
        let iso = self
            .each_credential_valid_for_iso
            .as_deref()
            .ok_or_else(|| IntervalError::InvalidDuration("<missing>".to_string()))?;

        CredentialPeriod::parse(iso)
    }

    /// Name of the signing identity for this item, `<merchant>?sku=<sku>`.
    #[must_use]
    pub fn issuer_name(&self, merchant: &str) -> String {
        format!("{}?sku={}", self.location.as_deref().unwrap_or(merchant), self.sku)
    }
}

/// Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderUuid,
    pub merchant_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub total_price: Decimal,
    pub location: Option<String>,
    pub allowed_payment_methods: Vec<String>,
    pub metadata: Option<Value>,
    pub valid_for: Option<SignedDuration>,
    pub last_paid_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// An order is paid when settled, or when canceled but still inside
    /// the period it was paid for.
    #[must_use]
    pub fn is_paid(&self, now: Timestamp) -> bool {
        match self.status {
            OrderStatus::Paid => true,
            OrderStatus::Canceled => self.expires_at.is_some_and(|expires_at| expires_at > now),
            OrderStatus::Pending => false,
        }
    }
}

/// Requested order line: a SKU token and quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub sku_token: String,
    pub quantity: u32,
}

/// New Order Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub items: Vec<NewOrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_type_round_trips_through_str() {
        for kind in [
            CredentialType::SingleUse,
            CredentialType::TimeLimited,
            CredentialType::TimeLimitedV2,
        ] {
            assert_eq!(kind.as_str().parse::<CredentialType>(), Ok(kind));
        }
    }

    #[test]
    fn default_issuer_config_spans_thirty_five_intervals() {
        assert_eq!(IssuerConfig::default().num_intervals(), 35);
    }

    #[test]
    fn canceled_order_is_paid_until_expiry() {
        let now = Timestamp::now();
        let mut order = Order {
            id: OrderUuid::new(),
            merchant_id: "brave.com".to_string(),
            status: OrderStatus::Canceled,
            currency: "USD".to_string(),
            total_price: Decimal::ONE,
            location: None,
            allowed_payment_methods: Vec::new(),
            metadata: None,
            valid_for: None,
            last_paid_at: None,
            expires_at: Some(now + SignedDuration::from_hours(1)),
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        };

        assert!(order.is_paid(now));

        order.expires_at = Some(now - SignedDuration::from_hours(1));

        assert!(!order.is_paid(now));
    }
}
