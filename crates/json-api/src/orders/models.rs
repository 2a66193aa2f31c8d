//! Order response models

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use skus_app::domain::orders::models::{NewOrder, NewOrderItem, Order, OrderItem};

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// SKU tokens and how many of each to buy
    pub items: Vec<CreateOrderItemRequest>,
}

/// One requested order line
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderItemRequest {
    /// Base64 SKU token
    pub sku: String,

    /// Number of units
    pub quantity: u32,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(request: CreateOrderRequest) -> Self {
        NewOrder {
            items: request
                .items
                .into_iter()
                .map(|item| NewOrderItem {
                    sku_token: item.sku,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub sku: String,
    pub credential_type: String,
    pub quantity: u32,

    /// Unit price as a decimal string
    pub price: String,

    /// `price × quantity` as a decimal string
    pub subtotal: String,
    pub currency: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub valid_for_iso: Option<String>,
    pub each_credential_valid_for_iso: Option<String>,
    pub issuance_interval_iso: Option<String>,
    pub created_at: String,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            id: item.id.into(),
            order_id: item.order_id.into(),
            sku: item.sku,
            credential_type: item.credential_type.to_string(),
            quantity: item.quantity,
            price: item.price.to_string(),
            subtotal: item.subtotal.to_string(),
            currency: item.currency,
            location: item.location,
            description: item.description,
            valid_for_iso: item.valid_for_iso,
            each_credential_valid_for_iso: item.each_credential_valid_for_iso,
            issuance_interval_iso: item.issuance_interval_iso,
            created_at: item.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    pub id: Uuid,
    pub merchant_id: String,

    /// `pending`, `paid` or `canceled`
    pub status: String,
    pub currency: String,
    pub total_price: String,
    pub location: Option<String>,
    pub allowed_payment_methods: Vec<String>,
    pub last_paid_at: Option<String>,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id.into(),
            merchant_id: order.merchant_id,
            status: order.status.as_str().to_string(),
            currency: order.currency,
            total_price: order.total_price.to_string(),
            location: order.location,
            allowed_payment_methods: order.allowed_payment_methods,
            last_paid_at: order.last_paid_at.as_ref().map(ToString::to_string),
            expires_at: order.expires_at.as_ref().map(ToString::to_string),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
            items: order.items.into_iter().map(Into::into).collect(),
        }
    }
}
