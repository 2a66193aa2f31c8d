use std::sync::Arc;

use clap::Args;
use skus_app::{
    database,
    database::Db,
    domain::orders::{OrdersService, PgOrdersService, models::OrderUuid},
    macaroon::TokenValidator,
};
use tracing::info;

use crate::cli::args::DatabaseArgs;

#[derive(Debug, Args)]
pub(crate) struct PaidArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Order that received a payment
    #[arg(long)]
    order_id: OrderUuid,

    /// Merchant owning the order's issuers
    #[arg(long, env = "SKUS_MERCHANT_ID", default_value = "brave.com")]
    merchant_id: String,
}

pub(crate) async fn run(args: PaidArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let orders = PgOrdersService::new(
        Db::new(pool),
        Arc::new(TokenValidator::default()),
        args.merchant_id,
    );

    let enqueued = orders
        .on_order_paid(args.order_id)
        .await
        .map_err(|error| format!("failed to mark order paid: {error}"))?;

    info!(order_id = %args.order_id, enqueued, "order marked paid");

    println!("order_id: {}", args.order_id);
    println!("signing_requests_enqueued: {enqueued}");

    Ok(())
}
