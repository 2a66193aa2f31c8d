use std::sync::Arc;

use clap::Args;
use skus_app::{
    bus::RestProxyWriter, database, database::Db, outbox::OutboxPublisher,
    signing::CodecRegistry,
};

use crate::cli::args::{BusArgs, DatabaseArgs};

#[derive(Debug, Args)]
pub(crate) struct PublishArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    bus: BusArgs,

    /// Maximum outbox rows published per transaction
    #[arg(long, env = "OUTBOX_BATCH_SIZE", default_value_t = 50)]
    batch_size: u32,
}

pub(crate) async fn run(args: PublishArgs) -> Result<(), String> {
    if args.batch_size == 0 {
        return Err("batch_size must be positive".to_string());
    }

    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let topics = args.bus.topics();
    let codecs = CodecRegistry::for_topics(&topics)
        .map_err(|error| format!("failed to register topic codecs: {error}"))?;

    let publisher = OutboxPublisher::new(
        Db::new(pool),
        Arc::new(RestProxyWriter::new(args.bus.rest_proxy())),
        Arc::new(codecs),
        topics.signing_requests,
        args.batch_size,
    );

    publisher
        .run(args.bus.poll_interval(), super::shutdown_on_signal())
        .await
        .map_err(|error| format!("outbox publisher stopped: {error}"))
}
