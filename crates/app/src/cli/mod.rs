use clap::{Parser, Subcommand};

mod args;
mod logging;
mod order;
mod sku;
mod worker;

#[derive(Debug, Parser)]
#[command(name = "skus-app", about = "SKUs operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    logging: args::LoggingArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Worker(worker::WorkerCommand),
    Order(order::OrderCommand),
    Sku(sku::SkuCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        logging::init(&self.logging)?;

        match self.command {
            Commands::Worker(command) => worker::run(command).await,
            Commands::Order(command) => order::run(command).await,
            Commands::Sku(command) => sku::run(command),
        }
    }
}
