//! Orders Repository

use jiff::{SignedDuration, Timestamp};
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};

use crate::domain::orders::models::{Order, OrderStatus, OrderUuid};

use super::decode_error;

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("../sql/lock_order.sql");
const MARK_PAID_SQL: &str = include_str!("../sql/mark_paid.sql");

/// Order header to insert.
#[derive(Debug, Clone)]
pub(crate) struct NewOrderRecord {
    pub id: OrderUuid,
    pub merchant_id: String,
    pub status: OrderStatus,
    pub currency: String,
    pub total_price: Decimal,
    pub location: Option<String>,
    pub allowed_payment_methods: Vec<String>,
    pub metadata: Option<Value>,
    pub valid_for: Option<SignedDuration>,
    pub last_paid_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrderRecord,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(CREATE_ORDER_SQL)
            .bind(order.id)
            .bind(&order.merchant_id)
            .bind(order.status.as_str())
            .bind(order.currency.as_str())
            .bind(order.total_price)
            .bind(order.location.as_deref())
            .bind(&order.allowed_payment_methods)
            .bind(order.metadata.as_ref().map(Json))
            .bind(order.valid_for.map(|valid_for| valid_for.as_secs()))
            .bind(order.last_paid_at.map(SqlxTimestamp::from))
            .bind(order.expires_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    /// Order header without items.
    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(GET_ORDER_SQL)
            .bind(order)
            .fetch_one(&mut **tx)
            .await
    }

    /// Order header, locked until the transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(LOCK_ORDER_SQL)
            .bind(order)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        paid_at: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<Order, sqlx::Error> {
        query_as::<Postgres, Order>(MARK_PAID_SQL)
            .bind(order)
            .bind(SqlxTimestamp::from(paid_at))
            .bind(expires_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for Order {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<OrderStatus>()
            .map_err(|message| decode_error("status", std::io::Error::other(message)))?;

        Ok(Self {
            id: row.try_get("id")?,
            merchant_id: row.try_get("merchant_id")?,
            status,
            currency: row.try_get("currency")?,
            total_price: row.try_get("total_price")?,
            location: row.try_get("location")?,
            allowed_payment_methods: row.try_get("allowed_payment_methods")?,
            metadata: row
                .try_get::<Option<Json<Value>>, _>("metadata")?
                .map(|Json(metadata)| metadata),
            valid_for: row
                .try_get::<Option<i64>, _>("valid_for_seconds")?
                .map(SignedDuration::from_secs),
            last_paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_paid_at")?
                .map(SqlxTimestamp::to_jiff),
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            items: Vec::new(),
        })
    }
}
