//! Submit Blinded Credentials Handler

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{credentials::errors::into_status_error, extensions::*};

/// Blinded tokens to be signed for an order item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateCredentialsRequest {
    pub blinded_creds: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CredentialsSubmittedResponse {
    /// Signing request the credentials will be correlated by
    pub request_id: Uuid,
}

/// Submit Blinded Credentials Handler
#[endpoint(
    tags("credentials"),
    summary = "Submit Blinded Credentials",
    responses(
        (status_code = StatusCode::OK, description = "Signing request enqueued"),
        (status_code = StatusCode::BAD_REQUEST, description = "Invalid blinded credentials"),
        (status_code = StatusCode::PAYMENT_REQUIRED, description = "Order is not paid"),
        (status_code = StatusCode::NOT_FOUND, description = "Order or item not found"),
        (status_code = StatusCode::CONFLICT, description = "Credentials already submitted"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    item: PathParam<Uuid>,
    json: JsonBody<CreateCredentialsRequest>,
    depot: &mut Depot,
) -> Result<Json<CredentialsSubmittedResponse>, StatusError> {
    let state = depot.app_state()?;

    let request_id = state
        .app
        .credentials
        .create_credentials(
            order.into_inner().into(),
            item.into_inner().into(),
            json.into_inner().blinded_creds,
        )
        .await
        .map_err(into_status_error)?;

    Ok(Json(CredentialsSubmittedResponse {
        request_id: request_id.into(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use skus_app::{
        domain::{
            credentials::{CredentialsServiceError, MockCredentialsService},
            orders::models::{CredentialType, OrderItemUuid, OrderUuid},
        },
        signing::RequestUuid,
    };

    use crate::test_helpers::credentials_service;

    use super::*;

    fn make_service(credentials: MockCredentialsService) -> Service {
        credentials_service(
            credentials,
            Router::with_path("v1/orders/{order}/credentials/items/{item}").post(handler),
        )
    }

    fn url(order: OrderUuid, item: OrderItemUuid) -> String {
        format!("http://example.com/v1/orders/{order}/credentials/items/{item}")
    }

    async fn submit_with_error(error: CredentialsServiceError) -> Option<StatusCode> {
        let mut credentials = MockCredentialsService::new();

        credentials
            .expect_create_credentials()
            .once()
            .return_once(move |_, _, _| Err(error));

        credentials.expect_get_credentials().never();

        TestClient::post(url(OrderUuid::new(), OrderItemUuid::new()))
            .json(&json!({ "blinded_creds": ["a"] }))
            .send(&make_service(credentials))
            .await
            .status_code
    }

    #[tokio::test]
    async fn test_submit_returns_request_id() -> TestResult {
        let order = OrderUuid::new();
        let item = OrderItemUuid::new();
        let request = RequestUuid::new();

        let mut credentials = MockCredentialsService::new();

        credentials
            .expect_create_credentials()
            .once()
            .withf(move |o, i, tokens| *o == order && *i == item && *tokens == ["a", "b"])
            .return_once(move |_, _, _| Ok(request));

        credentials.expect_get_credentials().never();

        let mut res = TestClient::post(url(order, item))
            .json(&json!({ "blinded_creds": ["a", "b"] }))
            .send(&make_service(credentials))
            .await;

        let body: CredentialsSubmittedResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(body.request_id, request.into_uuid());

        Ok(())
    }

    #[tokio::test]
    async fn test_submit_maps_service_errors() {
        assert_eq!(
            submit_with_error(CredentialsServiceError::NotFound).await,
            Some(StatusCode::NOT_FOUND)
        );
        assert_eq!(
            submit_with_error(CredentialsServiceError::AlreadyExists).await,
            Some(StatusCode::CONFLICT)
        );
        assert_eq!(
            submit_with_error(CredentialsServiceError::OrderNotPaid).await,
            Some(StatusCode::PAYMENT_REQUIRED)
        );
        assert_eq!(
            submit_with_error(CredentialsServiceError::UnsupportedCredentialType(
                CredentialType::TimeLimited
            ))
            .await,
            Some(StatusCode::BAD_REQUEST)
        );
    }

    #[tokio::test]
    async fn test_submit_without_tokens_field_returns_400() {
        let mut credentials = MockCredentialsService::new();

        credentials.expect_create_credentials().never();
        credentials.expect_get_credentials().never();

        let res = TestClient::post(url(OrderUuid::new(), OrderItemUuid::new()))
            .json(&json!({}))
            .send(&make_service(credentials))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
