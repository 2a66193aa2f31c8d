//! Test Helpers

use crate::{
    domain::orders::{
        OrdersService, OrdersServiceError,
        models::{NewOrder, NewOrderItem, Order},
    },
    macaroon::{Caveat, Macaroon, RootKey},
    signing::{AssociatedData, SignedOrder, SignedOrderStatus, SigningOrderRequest, SigningOrderResult},
    test::TestContext,
};

/// Key the test validator trusts.
pub(crate) const ROOT_KEY: &str = "skus-test-root-key";

pub(crate) const DEAD_LETTER_TOPIC: &str = "result.v1.dlq";

/// Mint a trusted SKU token carrying the given first-party caveats.
pub(crate) fn sku_token(caveats: &[&str]) -> String {
    Macaroon::mint(
        &RootKey::from(ROOT_KEY),
        Some("vpn.brave.com".to_string()),
        "test-sku",
        caveats.iter().map(|c| Caveat::first_party(*c)).collect(),
    )
    .expect("Failed to mint test SKU token")
    .encode()
}

pub(crate) fn single_use_token() -> String {
    sku_token(&[
        "sku=brave-together-paid",
        "price=5",
        "currency=USD",
        "description=One month paid subscription",
        "credential_type=single-use",
    ])
}

pub(crate) fn time_limited_v2_token(buffer: u32, overlap: u32) -> String {
    let buffer = format!("issuer_token_buffer={buffer}");
    let overlap = format!("issuer_token_overlap={overlap}");

    sku_token(&[
        "sku=brave-vpn-premium",
        "price=5",
        "currency=USD",
        "credential_type=time-limited-v2",
        "credential_valid_duration=P1M",
        "each_credential_valid_duration=P1D",
        "issuance_interval=P1D",
        &buffer,
        &overlap,
    ])
}

/// Distinct blinded token strings.
pub(crate) fn blinded_tokens(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("blinded-token-{i}")).collect()
}

pub(crate) async fn create_order(
    ctx: &TestContext,
    token: &str,
) -> Result<Order, OrdersServiceError> {
    ctx.orders
        .create_order(NewOrder {
            items: vec![NewOrderItem {
                sku_token: token.to_string(),
                quantity: 1,
            }],
        })
        .await
}

pub(crate) async fn create_paid_order(
    ctx: &TestContext,
    token: &str,
) -> Result<Order, OrdersServiceError> {
    create_paid_order_with(ctx, &[token.to_string()]).await
}

pub(crate) async fn create_paid_order_with(
    ctx: &TestContext,
    tokens: &[String],
) -> Result<Order, OrdersServiceError> {
    let order = ctx
        .orders
        .create_order(NewOrder {
            items: tokens
                .iter()
                .map(|token| NewOrderItem {
                    sku_token: token.clone(),
                    quantity: 1,
                })
                .collect(),
        })
        .await?;

    ctx.orders.on_order_paid(order.id).await?;
    ctx.orders.get_order(order.id).await
}

/// Answer a signing request the way the signer would, echoing the
/// associated data and interval of every entry.
pub(crate) fn sign(request: &SigningOrderRequest, status: SignedOrderStatus) -> SigningOrderResult {
    let ok = status == SignedOrderStatus::Ok;

    SigningOrderResult {
        request_id: request.request_id.to_string(),
        data: request
            .data
            .iter()
            .map(|order| {
                let interval = AssociatedData::decode(&order.associated_data)
                    .ok()
                    .and_then(|data| data.interval);

                SignedOrder {
                    signed_tokens: if ok {
                        order
                            .blinded_tokens
                            .iter()
                            .map(|token| format!("signed-{token}"))
                            .collect()
                    } else {
                        Vec::new()
                    },
                    public_key: if ok { "pk".to_string() } else { String::new() },
                    proof: if ok { "proof".to_string() } else { String::new() },
                    status,
                    associated_data: order.associated_data.clone(),
                    valid_to: interval.map(|window| window.valid_to.to_string()),
                    valid_from: interval.map(|window| window.valid_from.to_string()),
                    blinded_tokens: order.blinded_tokens.clone(),
                }
            })
            .collect(),
    }
}
