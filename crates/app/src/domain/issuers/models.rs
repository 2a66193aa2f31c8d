//! Issuer Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Issuer UUID
pub type IssuerUuid = TypedUuid<Issuer>;

/// Cohort used when none is configured.
pub const DEFAULT_ISSUER_COHORT: i16 = 1;

/// Signing identity for one merchant and SKU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuer {
    pub id: IssuerUuid,
    /// `<merchant>?sku=<sku>`
    pub name: String,
    pub cohort: i16,
    pub public_key: Option<String>,
    pub created_at: Timestamp,
}
