//! Order Errors

use salvo::http::StatusError;
use tracing::error;

use skus_app::domain::orders::OrdersServiceError;

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::AlreadyExists => StatusError::conflict().brief("Order already exists"),
        OrdersServiceError::Derivation(source) => {
            StatusError::bad_request().brief(format!("Invalid order item: {source}"))
        }
        OrdersServiceError::EmptyOrder
        | OrdersServiceError::MixedCurrencies
        | OrdersServiceError::MixedLocations
        | OrdersServiceError::TotalOverflow
        | OrdersServiceError::InvalidReference
        | OrdersServiceError::MissingRequiredData
        | OrdersServiceError::InvalidData => StatusError::bad_request().brief(error.to_string()),
        OrdersServiceError::Sql(source) => {
            error!("order storage failed: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Interval(source) => {
            error!("order item carries an unusable interval: {source}");

            StatusError::internal_server_error()
        }
        OrdersServiceError::Plan(source) => {
            error!("failed to plan signing request: {source}");

            StatusError::internal_server_error()
        }
    }
}
