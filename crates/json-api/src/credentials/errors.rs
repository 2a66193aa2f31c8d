//! Credential Errors

use salvo::http::StatusError;
use tracing::error;

use skus_app::domain::credentials::CredentialsServiceError;

pub(crate) fn into_status_error(error: CredentialsServiceError) -> StatusError {
    match error {
        CredentialsServiceError::NotFound => {
            StatusError::not_found().brief("Order or item not found")
        }
        CredentialsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Credentials already submitted for this item")
        }
        CredentialsServiceError::OrderNotPaid => {
            StatusError::payment_required().brief("Order is not paid")
        }
        CredentialsServiceError::UnsupportedCredentialType(_)
        | CredentialsServiceError::Plan(_)
        | CredentialsServiceError::InvalidReference
        | CredentialsServiceError::MissingRequiredData
        | CredentialsServiceError::InvalidData => {
            StatusError::bad_request().brief(error.to_string())
        }
        CredentialsServiceError::Sql(source) => {
            error!("credential storage failed: {source}");

            StatusError::internal_server_error()
        }
        CredentialsServiceError::Interval(source) => {
            error!("order item carries an unusable interval: {source}");

            StatusError::internal_server_error()
        }
    }
}
