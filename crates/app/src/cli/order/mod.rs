use clap::{Args, Subcommand};

mod paid;

#[derive(Debug, Args)]
pub(crate) struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Record a payment and re-issue time-limited credentials
    Paid(paid::PaidArgs),
}

pub(crate) async fn run(command: OrderCommand) -> Result<(), String> {
    match command.command {
        OrderSubcommand::Paid(args) => paid::run(args).await,
    }
}
