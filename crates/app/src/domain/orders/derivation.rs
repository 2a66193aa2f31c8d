//! Order item derivation from SKU tokens.
//!
//! Each first-party caveat is a `key=value` pair. Recognised keys are listed
//! in [`CAVEAT_KEYS`]; any other key is skipped.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    domain::orders::models::{CredentialType, IssuerConfig, ItemTerms, UnknownCredentialType},
    intervals::{self, IntervalError},
    macaroon::{MacaroonError, TokenValidator},
};

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Error)]
pub enum DerivationError {
    #[error("invalid SKU")]
    InvalidSku(#[source] MacaroonError),

    #[error("quantity must be at least one")]
    InvalidQuantity,

    #[error("invalid price {value:?}")]
    InvalidPrice {
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("subtotal overflows")]
    SubtotalOverflow,

    #[error("invalid {key} duration")]
    InvalidDuration {
        key: &'static str,
        #[source]
        source: IntervalError,
    },

    #[error("invalid {key} value {value:?}")]
    InvalidIssuerParameter { key: &'static str, value: String },

    #[error("invalid metadata")]
    InvalidMetadata(#[source] serde_json::Error),

    #[error(transparent)]
    UnknownCredentialType(#[from] UnknownCredentialType),

    #[error("missing {0} caveat")]
    MissingCaveat(&'static str),
}

/// Item fields a caveat may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaveatField {
    Sku,
    Price,
    Description,
    Currency,
    CredentialType,
    IssuanceInterval,
    CredentialValidDuration,
    EachCredentialValidDuration,
    IssuerTokenBuffer,
    IssuerTokenOverlap,
    AllowedPaymentMethods,
    Metadata,
}

/// Caveat key to item field mapping.
const CAVEAT_KEYS: &[(&str, CaveatField)] = &[
    ("sku", CaveatField::Sku),
    ("price", CaveatField::Price),
    ("amount", CaveatField::Price),
    ("description", CaveatField::Description),
    ("currency", CaveatField::Currency),
    ("credential_type", CaveatField::CredentialType),
    ("issuance_interval", CaveatField::IssuanceInterval),
    ("credential_valid_duration", CaveatField::CredentialValidDuration),
    (
        "each_credential_valid_duration",
        CaveatField::EachCredentialValidDuration,
    ),
    ("issuer_token_buffer", CaveatField::IssuerTokenBuffer),
    ("issuer_token_overlap", CaveatField::IssuerTokenOverlap),
    ("allowed_payment_methods", CaveatField::AllowedPaymentMethods),
    ("metadata", CaveatField::Metadata),
];

impl CaveatField {
    fn lookup(key: &str) -> Option<Self> {
        CAVEAT_KEYS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, field)| *field)
    }
}

/// Output of [`derive_order_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedItem {
    pub terms: ItemTerms,
    pub payment_methods: Vec<String>,
    pub issuer_config: IssuerConfig,
}

#[derive(Debug, Default)]
struct ItemBuilder {
    sku: Option<String>,
    price: Decimal,
    description: Option<String>,
    currency: Option<String>,
    credential_type: Option<CredentialType>,
    issuance_interval_iso: Option<String>,
    valid_for: Option<jiff::SignedDuration>,
    valid_for_iso: Option<String>,
    each_credential_valid_for_iso: Option<String>,
    issuer_config: IssuerConfig,
    payment_methods: Vec<String>,
    metadata: Map<String, Value>,
}

impl ItemBuilder {
    fn apply(
        &mut self,
        field: CaveatField,
        value: &str,
        now: Timestamp,
    ) -> Result<(), DerivationError> {
        match field {
            CaveatField::Sku => self.sku = Some(value.to_string()),
            CaveatField::Price => {
                self.price = value
                    .parse::<Decimal>()
                    .map_err(|source| DerivationError::InvalidPrice {
                        value: value.to_string(),
                        source,
                    })?;
            }
            CaveatField::Description => self.description = Some(value.to_string()),
            CaveatField::Currency => self.currency = Some(value.to_string()),
            CaveatField::CredentialType => self.credential_type = Some(value.parse()?),
            CaveatField::IssuanceInterval => self.issuance_interval_iso = Some(value.to_string()),
            CaveatField::CredentialValidDuration => {
                let valid_for = intervals::duration_from(now, value).map_err(|source| {
                    DerivationError::InvalidDuration {
                        key: "credential_valid_duration",
                        source,
                    }
                })?;

                self.valid_for = Some(valid_for);
                self.valid_for_iso = Some(value.to_string());
            }
            CaveatField::EachCredentialValidDuration => {
                intervals::parse_iso_duration(value).map_err(|source| {
                    DerivationError::InvalidDuration {
                        key: "each_credential_valid_duration",
                        source,
                    }
                })?;

                self.each_credential_valid_for_iso = Some(value.to_string());
            }
            CaveatField::IssuerTokenBuffer => {
                self.issuer_config.buffer = parse_count("issuer_token_buffer", value)?;
            }
            CaveatField::IssuerTokenOverlap => {
                self.issuer_config.overlap = parse_count("issuer_token_overlap", value)?;
            }
            CaveatField::AllowedPaymentMethods => {
                self.payment_methods = value
                    .split(',')
                    .map(str::trim)
                    .filter(|method| !method.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            CaveatField::Metadata => {
                let metadata: Map<String, Value> =
                    serde_json::from_str(value).map_err(DerivationError::InvalidMetadata)?;

                self.metadata.extend(metadata);
            }
        }

        Ok(())
    }

    fn build(
        self,
        location: Option<String>,
        quantity: u32,
    ) -> Result<DerivedItem, DerivationError> {
        let sku = self.sku.ok_or(DerivationError::MissingCaveat("sku"))?;
        let credential_type = self
            .credential_type
            .ok_or(DerivationError::MissingCaveat("credential_type"))?;

        if credential_type == CredentialType::TimeLimitedV2 {
            if self.issuance_interval_iso.is_none() {
                return Err(DerivationError::MissingCaveat("issuance_interval"));
            }

            if self.each_credential_valid_for_iso.is_none() {
                return Err(DerivationError::MissingCaveat(
                    "each_credential_valid_duration",
                ));
            }
        }

        let subtotal = self
            .price
            .checked_mul(Decimal::from(quantity))
            .ok_or(DerivationError::SubtotalOverflow)?;

        Ok(DerivedItem {
            terms: ItemTerms {
                sku,
                credential_type,
                quantity,
                price: self.price,
                subtotal,
                currency: self
                    .currency
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                location,
                description: self.description,
                valid_for: self.valid_for,
                valid_for_iso: self.valid_for_iso,
                each_credential_valid_for_iso: self.each_credential_valid_for_iso,
                issuance_interval_iso: self.issuance_interval_iso,
                issuer_config: self.issuer_config,
                metadata: self.metadata,
            },
            payment_methods: self.payment_methods,
            issuer_config: self.issuer_config,
        })
    }
}

fn parse_count(key: &'static str, value: &str) -> Result<u32, DerivationError> {
    value
        .parse::<u32>()
        .map_err(|_parse_error| DerivationError::InvalidIssuerParameter {
            key,
            value: value.to_string(),
        })
}

/// Derive an order item from a SKU token.
///
/// The token must be trusted by `validator` before any caveat is read.
///
/// # Errors
///
/// Returns [`DerivationError::InvalidSku`] for untrusted or undecodable
/// tokens, and a field specific error for malformed caveat values.
pub fn derive_order_item(
    validator: &TokenValidator,
    token: &str,
    quantity: u32,
    now: Timestamp,
) -> Result<DerivedItem, DerivationError> {
    if quantity == 0 {
        return Err(DerivationError::InvalidQuantity);
    }

    let macaroon = validator.validate(token).map_err(|source| {
        warn!("rejected SKU token: {source}");

        DerivationError::InvalidSku(source)
    })?;

    let mut builder = ItemBuilder::default();

    for caveat in macaroon.caveats() {
        let Some((key, value)) = caveat.key_value() else {
            continue;
        };

        match CaveatField::lookup(key) {
            Some(field) => builder.apply(field, value, now)?,
            None => debug!(key, "ignoring unrecognised caveat"),
        }
    }

    builder.build(macaroon.location().map(str::to_string), quantity)
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use crate::macaroon::{Caveat, Macaroon, RootKey};

    use super::*;

    const ROOT_KEY: &str = "derivation-test-key";

    fn validator() -> TokenValidator {
        TokenValidator::new([], Some(RootKey::from(ROOT_KEY)))
    }

    fn token(caveats: &[&str]) -> Result<String, MacaroonError> {
        Macaroon::mint(
            &RootKey::from(ROOT_KEY),
            Some("brave.com".to_string()),
            "test-sku",
            caveats.iter().map(|c| Caveat::first_party(*c)).collect(),
        )
        .map(|m| m.encode())
    }

    fn now() -> Timestamp {
        Timestamp::from_second(1_611_100_800).unwrap_or(Timestamp::UNIX_EPOCH)
    }

    #[test]
    fn derives_single_use_item() -> TestResult {
        let token = token(&[
            "sku=brave-together-paid",
            "price=5.01",
            "currency=USD",
            "description=One month of Brave Together",
            "credential_type=single-use",
            "allowed_payment_methods=stripe, uphold",
            "metadata={\"stripe_product_id\":\"prod_1\",\"note\":\"a=b\"}",
        ])?;

        let derived = derive_order_item(&validator(), &token, 3, now())?;

        assert_eq!(derived.terms.sku, "brave-together-paid");
        assert_eq!(derived.terms.credential_type, CredentialType::SingleUse);
        assert_eq!(derived.terms.price, "5.01".parse::<Decimal>()?);
        assert_eq!(derived.terms.subtotal, "15.03".parse::<Decimal>()?);
        assert_eq!(derived.terms.location.as_deref(), Some("brave.com"));
        assert_eq!(derived.payment_methods, vec!["stripe", "uphold"]);
        assert_eq!(
            derived.terms.metadata.get("note"),
            Some(&Value::String("a=b".to_string()))
        );
        assert_eq!(derived.issuer_config, IssuerConfig::default());

        Ok(())
    }

    #[test]
    fn subtotal_is_exact_decimal_product() -> TestResult {
        for (price, quantity, expected) in [
            ("0.1", 3, "0.3"),
            ("9.99", 7, "69.93"),
            ("0.00000001", 100_000_000, "1.00000000"),
        ] {
            let token = token(&["sku=x", "credential_type=single-use", format!("price={price}").as_str()])?;

            let derived = derive_order_item(&validator(), &token, quantity, now())?;

            assert_eq!(derived.terms.subtotal, expected.parse::<Decimal>()?);
        }

        Ok(())
    }

    #[test]
    fn derives_time_limited_v2_item_with_issuer_overrides() -> TestResult {
        let token = token(&[
            "sku=brave-vpn-premium",
            "amount=9.99",
            "credential_type=time-limited-v2",
            "credential_valid_duration=P1M",
            "each_credential_valid_duration=P1D",
            "issuance_interval=P1D",
            "issuer_token_buffer=2",
            "issuer_token_overlap=1",
        ])?;

        let derived = derive_order_item(&validator(), &token, 1, now())?;

        assert_eq!(derived.terms.credential_type, CredentialType::TimeLimitedV2);
        assert_eq!(
            derived.issuer_config,
            IssuerConfig {
                buffer: 2,
                overlap: 1
            }
        );
        assert_eq!(derived.terms.valid_for_iso.as_deref(), Some("P1M"));
        assert_eq!(
            derived.terms.valid_for,
            Some(SignedDuration::from_hours(31 * 24))
        );

        Ok(())
    }

    #[test]
    fn time_limited_v2_without_issuance_interval_is_rejected() -> TestResult {
        let token = token(&[
            "sku=brave-vpn-premium",
            "credential_type=time-limited-v2",
            "each_credential_valid_duration=P1D",
        ])?;

        let result = derive_order_item(&validator(), &token, 1, now());

        assert!(
            matches!(result, Err(DerivationError::MissingCaveat("issuance_interval"))),
            "expected missing issuance_interval, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn malformed_price_is_rejected() -> TestResult {
        let token = token(&["sku=x", "credential_type=single-use", "price=five"])?;

        let result = derive_order_item(&validator(), &token, 1, now());

        assert!(
            matches!(result, Err(DerivationError::InvalidPrice { .. })),
            "expected InvalidPrice, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn malformed_metadata_is_rejected() -> TestResult {
        let token = token(&["sku=x", "credential_type=single-use", "metadata={nope"])?;

        let result = derive_order_item(&validator(), &token, 1, now());

        assert!(
            matches!(result, Err(DerivationError::InvalidMetadata(_))),
            "expected InvalidMetadata, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn malformed_duration_is_rejected() -> TestResult {
        let token = token(&[
            "sku=x",
            "credential_type=single-use",
            "credential_valid_duration=forever",
        ])?;

        let result = derive_order_item(&validator(), &token, 1, now());

        assert!(
            matches!(
                result,
                Err(DerivationError::InvalidDuration {
                    key: "credential_valid_duration",
                    ..
                })
            ),
            "expected InvalidDuration, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn negative_buffer_is_rejected() -> TestResult {
        let token = token(&["sku=x", "credential_type=single-use", "issuer_token_buffer=-1"])?;

        let result = derive_order_item(&validator(), &token, 1, now());

        assert!(
            matches!(result, Err(DerivationError::InvalidIssuerParameter { .. })),
            "expected InvalidIssuerParameter, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn unknown_caveats_are_ignored() -> TestResult {
        let token = token(&["sku=x", "credential_type=single-use", "colour=blue"])?;

        assert!(derive_order_item(&validator(), &token, 1, now()).is_ok());

        Ok(())
    }

    #[test]
    fn untrusted_token_is_invalid_sku() -> TestResult {
        let foreign = Macaroon::mint(
            &RootKey::from("someone-else"),
            None,
            "id",
            vec![Caveat::first_party("sku=x")],
        )?
        .encode();

        let result = derive_order_item(&validator(), &foreign, 1, now());

        assert!(
            matches!(result, Err(DerivationError::InvalidSku(_))),
            "expected InvalidSku, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn zero_quantity_is_rejected() -> TestResult {
        let token = token(&["sku=x", "credential_type=single-use"])?;

        let result = derive_order_item(&validator(), &token, 0, now());

        assert!(
            matches!(result, Err(DerivationError::InvalidQuantity)),
            "expected InvalidQuantity, got {result:?}"
        );

        Ok(())
    }
}
