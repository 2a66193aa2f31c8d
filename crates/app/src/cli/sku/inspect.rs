use clap::Args;
use jiff::Timestamp;
use skus_app::{
    domain::orders::derivation::derive_order_item,
    macaroon::{Macaroon, RootKey, TokenValidator},
};

#[derive(Debug, Args)]
pub(crate) struct InspectArgs {
    /// Base64 SKU token
    #[arg(long)]
    token: String,

    /// Root key to verify the signature against
    #[arg(long, env = "SKUS_ROOT_KEY", hide_env_values = true)]
    root_key: Option<String>,
}

pub(crate) fn run(args: &InspectArgs) -> Result<(), String> {
    let macaroon =
        Macaroon::decode(&args.token).map_err(|error| format!("failed to decode token: {error}"))?;

    println!("location: {}", macaroon.location().unwrap_or("-"));
    println!(
        "identifier: {}",
        String::from_utf8_lossy(macaroon.identifier())
    );

    for caveat in macaroon.caveats() {
        println!("caveat: {}", String::from_utf8_lossy(&caveat.id));
    }

    if let Some(root_key) = args.root_key.as_deref() {
        println!("verified: {}", macaroon.verify(&RootKey::from(root_key)));
    }

    // Trust the token as given so derivation reports caveat problems rather
    // than signature problems.
    let validator = TokenValidator::new([args.token.clone()], None);

    let derived = derive_order_item(&validator, &args.token, 1, Timestamp::now())
        .map_err(|error| format!("token does not derive an order item: {error}"))?;

    println!("{:#?}", derived.terms);

    Ok(())
}
