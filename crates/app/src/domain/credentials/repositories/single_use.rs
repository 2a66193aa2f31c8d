//! Single-use Credentials Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::{
    credentials::models::SingleUseCredential,
    issuers::models::IssuerUuid,
    orders::models::{OrderItemUuid, OrderUuid},
};

const INSERT_SINGLE_USE_SQL: &str = include_str!("../sql/insert_single_use.sql");
const GET_SINGLE_USE_SQL: &str = include_str!("../sql/get_single_use.sql");
const STORE_SINGLE_USE_SIGNED_SQL: &str = include_str!("../sql/store_single_use_signed.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSingleUseCredentialsRepository;

impl PgSingleUseCredentialsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Record submitted blinded tokens ahead of signing.
    pub(crate) async fn insert_pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
        issuer: IssuerUuid,
        blinded_creds: &[String],
    ) -> Result<SingleUseCredential, sqlx::Error> {
        query_as::<Postgres, SingleUseCredential>(INSERT_SINGLE_USE_SQL)
            .bind(item)
            .bind(order)
            .bind(issuer)
            .bind(Json(blinded_creds))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<Option<SingleUseCredential>, sqlx::Error> {
        query_as::<Postgres, SingleUseCredential>(GET_SINGLE_USE_SQL)
            .bind(order)
            .bind(item)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Store signed material unless the item was already signed. Returns the
    /// number of rows written.
    pub(crate) async fn store_signed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
        signed_creds: &[String],
        batch_proof: &str,
        public_key: &str,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(STORE_SINGLE_USE_SIGNED_SQL)
            .bind(order)
            .bind(item)
            .bind(Json(signed_creds))
            .bind(batch_proof)
            .bind(public_key)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for SingleUseCredential {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(blinded_creds) = row.try_get::<Json<Vec<String>>, _>("blinded_creds")?;

        Ok(Self {
            item_id: row.try_get("item_id")?,
            order_id: row.try_get("order_id")?,
            issuer_id: row.try_get("issuer_id")?,
            blinded_creds,
            signed_creds: row
                .try_get::<Option<Json<Vec<String>>>, _>("signed_creds")?
                .map(|Json(signed)| signed),
            batch_proof: row.try_get("batch_proof")?,
            public_key: row.try_get("public_key")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
