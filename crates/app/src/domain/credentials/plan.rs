//! Signing request planning.

use jiff::Timestamp;
use thiserror::Error;
use tracing::debug;

use crate::{
    domain::{
        credentials::dedupe::dedupe_blinded_tokens,
        issuers::models::Issuer,
        orders::models::{CredentialType, OrderItem},
    },
    intervals::{IntervalError, plan_windows},
    signing::{AssociatedData, AssociatedDataError, RequestUuid, SigningOrder, SigningOrderRequest},
};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no blinded tokens submitted")]
    NoBlindedTokens,

    #[error("credential type {0} is not signed by the blind signer")]
    Unsupported(CredentialType),

    #[error("invalid issuance interval")]
    Interval(#[from] IntervalError),

    #[error("failed to encode associated data")]
    AssociatedData(#[from] AssociatedDataError),
}

/// Build the signing request for `item`.
///
/// Single-use items produce one signing order. Time-limited-v2 items
/// produce one signing order per planned window, each carrying the same
/// blinded tokens and its own window in the associated data.
///
/// # Errors
///
/// Returns an error when no tokens remain after de-duplication, the item
/// type is not blind signed, or the windows cannot be planned.
pub fn plan_signing_request(
    item: &OrderItem,
    issuer: &Issuer,
    blinded_tokens: Vec<String>,
    now: Timestamp,
) -> Result<SigningOrderRequest, PlanError> {
    let blinded_tokens = dedupe_blinded_tokens(blinded_tokens);

    if blinded_tokens.is_empty() {
        return Err(PlanError::NoBlindedTokens);
    }

    let associated_data = |interval| AssociatedData {
        order_id: item.order_id,
        item_id: item.id,
        issuer_id: issuer.id,
        credential_type: item.credential_type,
        interval,
    };

    let signing_order = |associated_data: AssociatedData| -> Result<SigningOrder, PlanError> {
        Ok(SigningOrder {
            associated_data: associated_data.encode()?,
            blinded_tokens: blinded_tokens.clone(),
            issuer_type: issuer.name.clone(),
            issuer_cohort: issuer.cohort,
        })
    };

    let data = match item.credential_type {
        CredentialType::SingleUse => vec![signing_order(associated_data(None))?],
        CredentialType::TimeLimitedV2 => {
            let period = item.credential_period()?;
            let config = item.issuer_config;

            plan_windows(now, &period, config.buffer, config.overlap)?
                .into_iter()
                .map(|window| signing_order(associated_data(Some(window))))
                .collect::<Result<Vec<_>, _>>()?
        }
        CredentialType::TimeLimited => return Err(PlanError::Unsupported(item.credential_type)),
    };

    debug!(
        order_id = %item.order_id,
        item_id = %item.id,
        issuer_id = %issuer.id,
        signing_orders = data.len(),
        "planned signing request"
    );

    Ok(SigningOrderRequest {
        request_id: RequestUuid::new(),
        data,
    })
}
