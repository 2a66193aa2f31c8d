//! App Router

use salvo::Router;

use crate::{credentials, orders};

pub(crate) fn app_router() -> Router {
    Router::with_path("v1/orders")
        .post(orders::create::handler)
        .push(
            Router::with_path("{order}")
                .get(orders::get::handler)
                .push(
                    Router::with_path("credentials/items/{item}")
                        .get(credentials::get::handler)
                        .post(credentials::create::handler),
                ),
        )
}
