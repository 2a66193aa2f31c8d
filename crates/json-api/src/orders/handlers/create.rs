//! Create Order Handler

use salvo::{http::header::LOCATION, oapi::extract::JsonBody, prelude::*};

use crate::{
    extensions::*,
    orders::{
        errors::into_status_error,
        models::{CreateOrderRequest, OrderResponse},
    },
};

/// Create Order Handler
///
/// Derives each item from its SKU token and creates a pending order.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    responses(
        (status_code = StatusCode::CREATED, description = "Order created"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid SKU token or order"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.app_state()?;

    let order = state
        .app
        .orders
        .create_order(json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    res.put_header(LOCATION, format_args!("/v1/orders/{}", order.id))?
        .status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use skus_app::{
        domain::orders::{
            MockOrdersService, OrdersServiceError,
            models::{NewOrder, NewOrderItem, OrderUuid},
        },
        intervals::IntervalError,
    };

    use crate::test_helpers::{make_order, orders_service};

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(orders, Router::with_path("v1/orders").post(handler))
    }

    fn expected_order() -> NewOrder {
        NewOrder {
            items: vec![NewOrderItem {
                sku_token: "sku-token".to_string(),
                quantity: 2,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_order_success() -> TestResult {
        let id = OrderUuid::new();
        let order = make_order(id);

        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .withf(|new| *new == expected_order())
            .return_once(move |_| Ok(order));

        orders.expect_get_order().never();
        orders.expect_on_order_paid().never();

        let mut res = TestClient::post("http://example.com/v1/orders")
            .json(&json!({ "items": [{ "sku": "sku-token", "quantity": 2 }] }))
            .send(&make_service(orders))
            .await;

        let body: OrderResponse = res.take_json().await?;
        let location = res.headers().get("location").and_then(|v| v.to_str().ok());

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(location, Some(format!("/v1/orders/{id}").as_str()));
        assert_eq!(body.id, id.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_mixed_currencies_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .return_once(|_| Err(OrdersServiceError::MixedCurrencies));

        orders.expect_get_order().never();
        orders.expect_on_order_paid().never();

        let res = TestClient::post("http://example.com/v1/orders")
            .json(&json!({ "items": [{ "sku": "sku-token", "quantity": 2 }] }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_internal_failure_returns_500() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_create_order()
            .once()
            .return_once(|_| {
                Err(OrdersServiceError::Interval(IntervalError::UnsupportedGranularity(
                    "P1DT1H".to_string(),
                )))
            });

        orders.expect_get_order().never();
        orders.expect_on_order_paid().never();

        let res = TestClient::post("http://example.com/v1/orders")
            .json(&json!({ "items": [{ "sku": "sku-token", "quantity": 1 }] }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::INTERNAL_SERVER_ERROR));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_malformed_body_returns_400() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_create_order().never();
        orders.expect_get_order().never();
        orders.expect_on_order_paid().never();

        let res = TestClient::post("http://example.com/v1/orders")
            .json(&json!({ "items": "nope" }))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
