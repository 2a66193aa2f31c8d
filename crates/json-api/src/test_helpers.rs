//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use rust_decimal::Decimal;
use salvo::{affix_state::inject, prelude::*};
use serde_json::Map;

use skus_app::{
    context::AppContext,
    domain::{
        credentials::MockCredentialsService,
        orders::{
            MockOrdersService,
            models::{
                CredentialType, IssuerConfig, Order, OrderItem, OrderItemUuid, OrderStatus,
                OrderUuid,
            },
        },
    },
};

use crate::state::State;

fn strict_orders_mock() -> MockOrdersService {
    let mut orders = MockOrdersService::new();

    orders.expect_create_order().never();
    orders.expect_get_order().never();
    orders.expect_on_order_paid().never();

    orders
}

fn strict_credentials_mock() -> MockCredentialsService {
    let mut credentials = MockCredentialsService::new();

    credentials.expect_create_credentials().never();
    credentials.expect_get_credentials().never();

    credentials
}

pub(crate) fn state_with(
    orders: MockOrdersService,
    credentials: MockCredentialsService,
) -> Arc<State> {
    State::from_app_context(AppContext {
        orders: Arc::new(orders),
        credentials: Arc::new(credentials),
    })
}

pub(crate) fn orders_service(orders: MockOrdersService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with(orders, strict_credentials_mock())))
            .push(route),
    )
}

pub(crate) fn credentials_service(credentials: MockCredentialsService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(state_with(strict_orders_mock(), credentials)))
            .push(route),
    )
}

pub(crate) fn make_order(id: OrderUuid) -> Order {
    let now = Timestamp::now();

    Order {
        id,
        merchant_id: "brave.com".to_string(),
        status: OrderStatus::Pending,
        currency: "USD".to_string(),
        total_price: Decimal::new(500, 2),
        location: Some("vpn.brave.com".to_string()),
        allowed_payment_methods: vec!["stripe".to_string()],
        metadata: None,
        valid_for: None,
        last_paid_at: None,
        expires_at: None,
        created_at: now,
        updated_at: now,
        items: vec![OrderItem {
            id: OrderItemUuid::new(),
            order_id: id,
            sku: "brave-vpn-premium".to_string(),
            credential_type: CredentialType::TimeLimitedV2,
            quantity: 1,
            price: Decimal::new(500, 2),
            subtotal: Decimal::new(500, 2),
            currency: "USD".to_string(),
            location: Some("vpn.brave.com".to_string()),
            description: None,
            valid_for: None,
            valid_for_iso: Some("P1M".to_string()),
            each_credential_valid_for_iso: Some("P1D".to_string()),
            issuance_interval_iso: Some("P1D".to_string()),
            issuer_config: IssuerConfig::default(),
            metadata: Map::new(),
            created_at: now,
        }],
    }
}
