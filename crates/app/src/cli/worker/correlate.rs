use std::{sync::Arc, time::Duration};

use clap::Args;
use skus_app::{
    bus::{RestProxyReader, RestProxyWriter},
    correlator::SigningResultCorrelator,
    database,
    database::Db,
    signing::CodecRegistry,
};

use crate::cli::args::{BusArgs, DatabaseArgs};

#[derive(Debug, Args)]
pub(crate) struct CorrelateArgs {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    bus: BusArgs,

    /// Milliseconds to back off after a transient failure
    #[arg(long, env = "WORKER_RETRY_DELAY_MS", default_value_t = 5000)]
    retry_delay_ms: u64,
}

pub(crate) async fn run(args: CorrelateArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let topics = args.bus.topics();
    let codecs = CodecRegistry::for_topics(&topics)
        .map_err(|error| format!("failed to register topic codecs: {error}"))?;

    let reader = RestProxyReader::subscribe(
        args.bus.rest_proxy(),
        &topics.consumer_group,
        &topics.signing_results,
    )
    .await
    .map_err(|error| format!("failed to subscribe to {}: {error}", topics.signing_results))?;

    let correlator = SigningResultCorrelator::new(
        Db::new(pool),
        Arc::new(reader),
        Arc::new(RestProxyWriter::new(args.bus.rest_proxy())),
        Arc::new(codecs),
        topics,
        Duration::from_millis(args.retry_delay_ms),
    );

    correlator
        .run(super::shutdown_on_signal())
        .await
        .map_err(|error| format!("signing result correlator stopped: {error}"))
}
