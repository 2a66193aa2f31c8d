//! Issuers Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::issuers::models::{Issuer, IssuerUuid};

const GET_OR_CREATE_ISSUER_SQL: &str = include_str!("sql/get_or_create_issuer.sql");
const GET_ISSUER_SQL: &str = include_str!("sql/get_issuer.sql");
const RECORD_PUBLIC_KEY_SQL: &str = include_str!("sql/record_public_key.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgIssuersRepository;

impl PgIssuersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Existing issuer for `(name, cohort)`, or a new one.
    pub(crate) async fn get_or_create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        cohort: i16,
    ) -> Result<Issuer, sqlx::Error> {
        query_as::<Postgres, Issuer>(GET_OR_CREATE_ISSUER_SQL)
            .bind(IssuerUuid::new())
            .bind(name)
            .bind(cohort)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        issuer: IssuerUuid,
    ) -> Result<Issuer, sqlx::Error> {
        query_as::<Postgres, Issuer>(GET_ISSUER_SQL)
            .bind(issuer)
            .fetch_one(&mut **tx)
            .await
    }

    /// Record the signer's public key unless one is already known.
    pub(crate) async fn record_public_key(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        issuer: IssuerUuid,
        public_key: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RECORD_PUBLIC_KEY_SQL)
            .bind(issuer)
            .bind(public_key)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for Issuer {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("merchant_id")?,
            cohort: row.try_get("cohort")?,
            public_key: row.try_get("public_key")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
