//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        credentials::{CredentialsService, PgCredentialsService},
        orders::{OrdersService, PgOrdersService},
    },
    macaroon::{RootKey, TokenValidator},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

/// Settings shared by the order and credential services.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Merchant that owns every order and names its issuers.
    pub merchant_id: String,

    /// SKU tokens trusted without signature verification.
    pub whitelisted_skus: Vec<String>,

    /// Key used to verify SKU token signatures.
    pub root_key: Option<RootKey>,

    /// Completed signing requests averaged for the retry hint.
    pub retry_window: u32,
}

#[derive(Clone)]
pub struct AppContext {
    pub orders: Arc<dyn OrdersService>,
    pub credentials: Arc<dyn CredentialsService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str, settings: AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        Ok(Self::from_db(Db::new(pool), settings))
    }

    /// Build application context over an existing pool.
    #[must_use]
    pub fn from_db(db: Db, settings: AppSettings) -> Self {
        let validator = Arc::new(TokenValidator::new(
            settings.whitelisted_skus,
            settings.root_key,
        ));

        Self {
            orders: Arc::new(PgOrdersService::new(
                db.clone(),
                validator,
                settings.merchant_id,
            )),
            credentials: Arc::new(PgCredentialsService::new(db, settings.retry_window)),
        }
    }
}

