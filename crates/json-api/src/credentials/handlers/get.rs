//! Get Credentials Handler

use salvo::{http::header::RETRY_AFTER, prelude::*};
use uuid::Uuid;

use skus_app::domain::credentials::CredentialState;

use crate::{credentials::errors::into_status_error, extensions::*};

fn path_uuid(req: &Request, name: &str) -> Result<Uuid, StatusError> {
    req.param::<Uuid>(name)
        .ok_or_else(|| StatusError::bad_request().brief(format!("invalid {name} id")))
}

/// Get Credentials Handler
///
/// `200` with the signed credentials, `202` with `Retry-After` while signing
/// is outstanding, `404` when nothing was submitted.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<(), StatusError> {
    let state = depot.app_state()?;
    let order = path_uuid(req, "order")?;
    let item = path_uuid(req, "item")?;

    let credentials = state
        .app
        .credentials
        .get_credentials(order.into(), item.into())
        .await
        .map_err(into_status_error)?;

    match credentials {
        CredentialState::Absent => {
            Err(StatusError::not_found().brief("No credentials submitted for this item"))
        }
        CredentialState::Pending {
            retry_after_seconds,
        } => {
            res.put_header(RETRY_AFTER, retry_after_seconds)?
                .status_code(StatusCode::ACCEPTED);

            Ok(())
        }
        CredentialState::Ready(credentials) => {
            res.render(Json(credentials));

            Ok(())
        }
    }
}
