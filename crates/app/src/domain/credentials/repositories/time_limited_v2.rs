//! Time-limited-v2 Credentials Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};

use crate::domain::{
    credentials::models::{
        NewTimeLimitedV2Credential, TimeLimitedV2Credential, TimeLimitedV2CredentialUuid,
    },
    orders::models::{OrderItemUuid, OrderUuid},
};

const INSERT_TIME_LIMITED_V2_SQL: &str = include_str!("../sql/insert_time_limited_v2.sql");
const LIST_TIME_LIMITED_V2_SQL: &str = include_str!("../sql/list_time_limited_v2.sql");
const DELETE_TIME_LIMITED_V2_BEFORE_SQL: &str =
    include_str!("../sql/delete_time_limited_v2_before.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTimeLimitedV2CredentialsRepository;

impl PgTimeLimitedV2CredentialsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Store one signed interval. An interval already stored for the item is
    /// left untouched and `0` is returned.
    pub(crate) async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        credential: &NewTimeLimitedV2Credential,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(INSERT_TIME_LIMITED_V2_SQL)
            .bind(TimeLimitedV2CredentialUuid::new())
            .bind(credential.item_id)
            .bind(credential.order_id)
            .bind(credential.issuer_id)
            .bind(credential.request_id)
            .bind(Json(&credential.blinded_creds))
            .bind(Json(&credential.signed_creds))
            .bind(&credential.batch_proof)
            .bind(&credential.public_key)
            .bind(SqlxTimestamp::from(credential.valid_from))
            .bind(SqlxTimestamp::from(credential.valid_to))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<Vec<TimeLimitedV2Credential>, sqlx::Error> {
        query_as::<Postgres, TimeLimitedV2Credential>(LIST_TIME_LIMITED_V2_SQL)
            .bind(order)
            .bind(item)
            .fetch_all(&mut **tx)
            .await
    }

    /// Delete intervals of `item` that ended before `cutoff`.
    pub(crate) async fn delete_ended_before(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
        cutoff: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TIME_LIMITED_V2_BEFORE_SQL)
            .bind(order)
            .bind(item)
            .bind(SqlxTimestamp::from(cutoff))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for TimeLimitedV2Credential {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(blinded_creds) = row.try_get::<Json<Vec<String>>, _>("blinded_creds")?;
        let Json(signed_creds) = row.try_get::<Json<Vec<String>>, _>("signed_creds")?;

        Ok(Self {
            id: row.try_get("id")?,
            item_id: row.try_get("item_id")?,
            order_id: row.try_get("order_id")?,
            issuer_id: row.try_get("issuer_id")?,
            request_id: row.try_get("request_id")?,
            blinded_creds,
            signed_creds,
            batch_proof: row.try_get("batch_proof")?,
            public_key: row.try_get("public_key")?,
            valid_from: row.try_get::<SqlxTimestamp, _>("valid_from")?.to_jiff(),
            valid_to: row.try_get::<SqlxTimestamp, _>("valid_to")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
