use clap::{Args, Subcommand};

mod inspect;
mod mint;

#[derive(Debug, Args)]
pub(crate) struct SkuCommand {
    #[command(subcommand)]
    command: SkuSubcommand,
}

#[derive(Debug, Subcommand)]
enum SkuSubcommand {
    /// Decode a SKU token and show the item it derives
    Inspect(inspect::InspectArgs),

    /// Mint a SKU token
    Mint(mint::MintArgs),
}

pub(crate) fn run(command: SkuCommand) -> Result<(), String> {
    match command.command {
        SkuSubcommand::Inspect(args) => inspect::run(&args),
        SkuSubcommand::Mint(args) => mint::run(args),
    }
}
