//! Shared state lookup.

use std::sync::Arc;

use salvo::prelude::{Depot, StatusError};
use tracing::error;

use crate::state::State;

pub(crate) trait StateDepotExt {
    /// The injected [`State`], or a 500 when the router was built without it.
    fn app_state(&self) -> Result<&Arc<State>, StatusError>;
}

impl StateDepotExt for Depot {
    fn app_state(&self) -> Result<&Arc<State>, StatusError> {
        self.obtain::<Arc<State>>().map_err(|_missing| {
            error!("application state was not injected into the depot");

            StatusError::internal_server_error()
        })
    }
}
