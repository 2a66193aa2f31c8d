//! Derivation Config

use clap::Args;
use skus_app::{
    context::AppSettings, domain::credentials::DEFAULT_RETRY_WINDOW, macaroon::RootKey,
};

/// SKU token trust and credential issuance settings.
#[derive(Debug, Args)]
pub struct DerivationConfig {
    /// Merchant that owns created orders
    #[arg(long, env = "SKUS_MERCHANT_ID", default_value = "brave.com")]
    pub merchant_id: String,

    /// Comma separated SKU tokens trusted without signature verification
    #[arg(long, env = "SKUS_WHITELIST", value_delimiter = ',')]
    pub whitelisted_skus: Vec<String>,

    /// Root key used to verify SKU token signatures
    #[arg(long, env = "SKUS_ROOT_KEY", hide_env_values = true)]
    pub root_key: Option<String>,

    /// Completed signing requests averaged for the `Retry-After` hint
    #[arg(long, env = "SKUS_RETRY_WINDOW", default_value_t = DEFAULT_RETRY_WINDOW)]
    pub retry_window: u32,
}

impl DerivationConfig {
    /// Settings for the application services.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            merchant_id: self.merchant_id.clone(),
            whitelisted_skus: self.whitelisted_skus.clone(),
            root_key: self
                .root_key
                .as_deref()
                .filter(|key| !key.is_empty())
                .map(RootKey::from),
            retry_window: self.retry_window,
        }
    }
}
