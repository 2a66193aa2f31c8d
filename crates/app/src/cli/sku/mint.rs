use clap::Args;
use skus_app::macaroon::{Caveat, Macaroon, RootKey};

#[derive(Debug, Args)]
pub(crate) struct MintArgs {
    /// Root key the token is signed with
    #[arg(long, env = "SKUS_ROOT_KEY", hide_env_values = true)]
    root_key: String,

    /// Merchant location, e.g. `brave.com`
    #[arg(long)]
    location: Option<String>,

    /// Token identifier
    #[arg(long)]
    identifier: String,

    /// First-party caveat as `key=value`; repeatable
    #[arg(long = "caveat", value_name = "KEY=VALUE")]
    caveats: Vec<String>,
}

pub(crate) fn run(args: MintArgs) -> Result<(), String> {
    if args.root_key.is_empty() {
        return Err("root_key cannot be empty".to_string());
    }

    if let Some(caveat) = args.caveats.iter().find(|caveat| !caveat.contains('=')) {
        return Err(format!("caveat {caveat:?} is not in key=value form"));
    }

    let macaroon = Macaroon::mint(
        &RootKey::from(args.root_key.as_str()),
        args.location,
        args.identifier,
        args.caveats.into_iter().map(Caveat::first_party).collect(),
    )
    .map_err(|error| format!("failed to mint token: {error}"))?;

    println!("{}", macaroon.encode());

    Ok(())
}
