//! Order Items Repository

use jiff::SignedDuration;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use serde_json::{Map, Value};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};

use crate::domain::orders::models::{
    CredentialType, IssuerConfig, ItemTerms, OrderItem, OrderItemUuid, OrderUuid,
};

use super::decode_error;

const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const GET_ORDER_ITEMS_SQL: &str = include_str!("../sql/get_order_items.sql");

fn to_i32(column: &str, value: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|error| decode_error(column, error))
}

fn try_get_u32(row: &PgRow, column: &str) -> Result<u32, sqlx::Error> {
    let value: i32 = row.try_get(column)?;

    u32::try_from(value).map_err(|error| decode_error(column, error))
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        terms: &ItemTerms,
    ) -> Result<OrderItem, sqlx::Error> {
        let metadata = (!terms.metadata.is_empty()).then_some(Json(&terms.metadata));

        query_as::<Postgres, OrderItem>(CREATE_ORDER_ITEM_SQL)
            .bind(OrderItemUuid::new())
            .bind(order)
            .bind(terms.sku.as_str())
            .bind(terms.credential_type.as_str())
            .bind(to_i32("quantity", terms.quantity)?)
            .bind(terms.price)
            .bind(terms.subtotal)
            .bind(terms.currency.as_str())
            .bind(terms.location.as_deref())
            .bind(terms.description.as_deref())
            .bind(terms.valid_for.map(|valid_for| valid_for.as_secs()))
            .bind(terms.valid_for_iso.as_deref())
            .bind(terms.each_credential_valid_for_iso.as_deref())
            .bind(terms.issuance_interval_iso.as_deref())
            .bind(to_i32("issuer_token_buffer", terms.issuer_config.buffer)?)
            .bind(to_i32("issuer_token_overlap", terms.issuer_config.overlap)?)
            .bind(metadata)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        query_as::<Postgres, OrderItem>(GET_ORDER_ITEMS_SQL)
            .bind(order)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let credential_type = row
            .try_get::<String, _>("credential_type")?
            .parse::<CredentialType>()
            .map_err(|error| decode_error("credential_type", error))?;

        Ok(Self {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            sku: row.try_get("sku")?,
            credential_type,
            quantity: try_get_u32(row, "quantity")?,
            price: row.try_get("price")?,
            subtotal: row.try_get("subtotal")?,
            currency: row.try_get("currency")?,
            location: row.try_get("location")?,
            description: row.try_get("description")?,
            valid_for: row
                .try_get::<Option<i64>, _>("valid_for_seconds")?
                .map(SignedDuration::from_secs),
            valid_for_iso: row.try_get("valid_for_iso")?,
            each_credential_valid_for_iso: row.try_get("each_credential_valid_for_iso")?,
            issuance_interval_iso: row.try_get("issuance_interval_iso")?,
            issuer_config: IssuerConfig {
                buffer: try_get_u32(row, "issuer_token_buffer")?,
                overlap: try_get_u32(row, "issuer_token_overlap")?,
            },
            metadata: row
                .try_get::<Option<Json<Map<String, Value>>>, _>("metadata")?
                .map(|Json(metadata)| metadata)
                .unwrap_or_default(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
