use clap::{Args, Subcommand};
use tokio::sync::watch;
use tracing::error;

mod correlate;
mod publish;

#[derive(Debug, Args)]
pub(crate) struct WorkerCommand {
    #[command(subcommand)]
    command: WorkerSubcommand,
}

#[derive(Debug, Subcommand)]
enum WorkerSubcommand {
    /// Publish pending signing requests from the outbox
    Publish(publish::PublishArgs),

    /// Correlate signing results back onto credentials
    Correlate(correlate::CorrelateArgs),
}

pub(crate) async fn run(command: WorkerCommand) -> Result<(), String> {
    match command.command {
        WorkerSubcommand::Publish(args) => publish::run(args).await,
        WorkerSubcommand::Correlate(args) => correlate::run(args).await,
    }
}

/// Shutdown receiver flipped by SIGINT/SIGTERM.
fn shutdown_on_signal() -> watch::Receiver<bool> {
    let (sender, receiver) = skus_app::shutdown::channel();

    tokio::spawn(async move {
        if let Err(source) = skus_app::shutdown::listen(sender).await {
            error!("failed to listen for shutdown signals: {source}");
        }
    });

    receiver
}
