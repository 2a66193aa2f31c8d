//! Outbox Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{
    FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar,
    types::Json,
};

use crate::{
    domain::orders::models::{OrderItemUuid, OrderUuid},
    outbox::models::{NewOutboxEntry, OutboxEntry, OutboxEntryUuid},
    signing::{RequestUuid, SigningOrderRequest},
};

const INSERT_ENTRY_SQL: &str = include_str!("sql/insert_entry.sql");
const LOCK_UNPROCESSED_SQL: &str = include_str!("sql/lock_unprocessed.sql");
const MARK_PROCESSED_SQL: &str = include_str!("sql/mark_processed.sql");
const MARK_COMPLETED_SQL: &str = include_str!("sql/mark_completed.sql");
const LATEST_FOR_ITEM_SQL: &str = include_str!("sql/latest_for_item.sql");
const AVERAGE_SIGNING_SECONDS_SQL: &str = include_str!("sql/average_signing_seconds.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOutboxRepository;

impl PgOutboxRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &NewOutboxEntry,
    ) -> Result<OutboxEntry, sqlx::Error> {
        query_as::<Postgres, OutboxEntry>(INSERT_ENTRY_SQL)
            .bind(OutboxEntryUuid::new())
            .bind(entry.order_id)
            .bind(entry.item_id)
            .bind(entry.message.request_id)
            .bind(Json(&entry.message))
            .fetch_one(&mut **tx)
            .await
    }

    /// Oldest unprocessed entries, locked for the rest of the transaction.
    /// Entries locked by another publisher are skipped.
    pub(crate) async fn lock_unprocessed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        limit: u32,
    ) -> Result<Vec<OutboxEntry>, sqlx::Error> {
        query_as::<Postgres, OutboxEntry>(LOCK_UNPROCESSED_SQL)
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn mark_processed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: OutboxEntryUuid,
        processed_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_PROCESSED_SQL)
            .bind(entry)
            .bind(SqlxTimestamp::from(processed_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn mark_completed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: RequestUuid,
        completed_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(MARK_COMPLETED_SQL)
            .bind(request)
            .bind(SqlxTimestamp::from(completed_at))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn latest_for_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<Option<OutboxEntry>, sqlx::Error> {
        query_as::<Postgres, OutboxEntry>(LATEST_FOR_ITEM_SQL)
            .bind(order)
            .bind(item)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Mean seconds from enqueue to completion over the `window` most
    /// recently completed entries.
    pub(crate) async fn average_signing_seconds(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        window: u32,
    ) -> Result<Option<f64>, sqlx::Error> {
        query_scalar::<Postgres, Option<f64>>(AVERAGE_SIGNING_SECONDS_SQL)
            .bind(i64::from(window))
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OutboxEntry {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(message) = row.try_get::<Json<SigningOrderRequest>, _>("message")?;

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            item_id: row.try_get("item_id")?,
            request_id: row.try_get("request_id")?,
            message,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            processed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("processed_at")?
                .map(SqlxTimestamp::to_jiff),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
