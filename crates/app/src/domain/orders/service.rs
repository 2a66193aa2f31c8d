//! Orders service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    database::Db,
    domain::{
        credentials::{PgTimeLimitedV2CredentialsRepository, dedupe::dedupe, plan},
        issuers::{PgIssuersRepository, models::DEFAULT_ISSUER_COHORT},
        orders::{
            derivation::{DerivedItem, derive_order_item},
            errors::OrdersServiceError,
            models::{CredentialType, NewOrder, Order, OrderStatus, OrderUuid},
            repositories::{NewOrderRecord, PgOrderItemsRepository, PgOrdersRepository},
        },
    },
    intervals::{self, IntervalError},
    macaroon::TokenValidator,
    outbox::{PgOutboxRepository, models::NewOutboxEntry},
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    validator: Arc<TokenValidator>,
    merchant_id: String,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    issuers_repository: PgIssuersRepository,
    outbox_repository: PgOutboxRepository,
    credentials_repository: PgTimeLimitedV2CredentialsRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, validator: Arc<TokenValidator>, merchant_id: String) -> Self {
        Self {
            db,
            validator,
            merchant_id,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            issuers_repository: PgIssuersRepository::new(),
            outbox_repository: PgOutboxRepository::new(),
            credentials_repository: PgTimeLimitedV2CredentialsRepository::new(),
        }
    }
}

/// Validity of a paid order whose items carry no `credential_valid_duration`.
const DEFAULT_VALID_FOR_ISO: &str = "P1M";

/// When an order paid at `paid_at` lapses: the longest item period resolved
/// on the calendar at that instant.
fn paid_until<'a>(
    paid_at: Timestamp,
    valid_for_isos: impl IntoIterator<Item = &'a str>,
) -> Result<Timestamp, IntervalError> {
    let mut longest: Option<SignedDuration> = None;

    for iso in valid_for_isos {
        longest = longest.max(Some(intervals::duration_from(paid_at, iso)?));
    }

    let valid_for = match longest {
        Some(valid_for) => valid_for,
        None => intervals::duration_from(paid_at, DEFAULT_VALID_FOR_ISO)?,
    };

    Ok(paid_at.checked_add(valid_for)?)
}

/// Order header totals shared by every item.
fn summarise(
    merchant_id: &str,
    derived: &[DerivedItem],
    now: Timestamp,
) -> Result<NewOrderRecord, OrdersServiceError> {
    let first = derived.first().ok_or(OrdersServiceError::EmptyOrder)?;

    if derived
        .iter()
        .any(|item| item.terms.currency != first.terms.currency)
    {
        return Err(OrdersServiceError::MixedCurrencies);
    }

    if derived
        .iter()
        .any(|item| item.terms.location != first.terms.location)
    {
        return Err(OrdersServiceError::MixedLocations);
    }

    let total_price = derived.iter().try_fold(Decimal::ZERO, |total, item| {
        total
            .checked_add(item.terms.subtotal)
            .ok_or(OrdersServiceError::TotalOverflow)
    })?;

    let valid_for = derived.iter().filter_map(|item| item.terms.valid_for).max();

    let allowed_payment_methods = dedupe(
        derived
            .iter()
            .flat_map(|item| item.payment_methods.iter().cloned()),
    );

    let (status, last_paid_at, expires_at) = if total_price.is_zero() {
        let expires_at = paid_until(
            now,
            derived
                .iter()
                .filter_map(|item| item.terms.valid_for_iso.as_deref()),
        )?;

        (OrderStatus::Paid, Some(now), Some(expires_at))
    } else {
        (OrderStatus::Pending, None, None)
    };

    Ok(NewOrderRecord {
        id: OrderUuid::new(),
        merchant_id: merchant_id.to_string(),
        status,
        currency: first.terms.currency.clone(),
        total_price,
        location: first.terms.location.clone(),
        allowed_payment_methods,
        metadata: None,
        valid_for,
        last_paid_at,
        expires_at,
    })
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrdersServiceError> {
        let now = Timestamp::now();

        let derived = order
            .items
            .iter()
            .map(|item| derive_order_item(&self.validator, &item.sku_token, item.quantity, now))
            .collect::<Result<Vec<_>, _>>()?;

        let record = summarise(&self.merchant_id, &derived, now)?;

        let mut tx = self.db.begin().await?;

        let mut created = self.orders_repository.create_order(&mut tx, &record).await?;

        for item in &derived {
            let item = self
                .items_repository
                .create_item(&mut tx, created.id, &item.terms)
                .await?;

            if item.credential_type.is_blind_signed() {
                self.issuers_repository
                    .get_or_create(
                        &mut tx,
                        &item.issuer_name(&created.merchant_id),
                        DEFAULT_ISSUER_COHORT,
                    )
                    .await?;
            }

            created.items.push(item);
        }

        tx.commit().await?;

        info!(
            order_id = %created.id,
            items = created.items.len(),
            total = %created.total_price,
            status = created.status.as_str(),
            "created order"
        );

        Ok(created)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut found = self.orders_repository.get_order(&mut tx, order).await?;
        let items = self.items_repository.get_items(&mut tx, order).await?;

        tx.commit().await?;

        found.items.extend(items);

        Ok(found)
    }

    async fn on_order_paid(&self, order: OrderUuid) -> Result<u64, OrdersServiceError> {
        let now = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let locked = self.orders_repository.lock_order(&mut tx, order).await?;
        let items = self.items_repository.get_items(&mut tx, order).await?;

        let expires_at = paid_until(
            now,
            items.iter().filter_map(|item| item.valid_for_iso.as_deref()),
        )?;

        self.orders_repository
            .mark_paid(&mut tx, order, now, Some(expires_at))
            .await?;

        let mut enqueued = 0;

        for item in items
            .iter()
            .filter(|item| item.credential_type == CredentialType::TimeLimitedV2)
        {
            let period = item.credential_period()?;
            let cutoff = period.rewind(now, item.issuer_config.overlap)?;

            let deleted = self
                .credentials_repository
                .delete_ended_before(&mut tx, order, item.id, cutoff)
                .await?;

            let Some(previous) = self
                .outbox_repository
                .latest_for_item(&mut tx, order, item.id)
                .await?
            else {
                continue;
            };

            if !previous.is_completed() {
                info!(
                    order_id = %order,
                    item_id = %item.id,
                    request_id = %previous.request_id,
                    "signing request still in flight, not renewing"
                );

                continue;
            }

            let blinded_tokens = previous
                .message
                .data
                .into_iter()
                .next()
                .map(|signing_order| signing_order.blinded_tokens)
                .unwrap_or_default();

            let issuer = self
                .issuers_repository
                .get_or_create(
                    &mut tx,
                    &item.issuer_name(&locked.merchant_id),
                    DEFAULT_ISSUER_COHORT,
                )
                .await?;

            let message = plan::plan_signing_request(item, &issuer, blinded_tokens, now)?;

            let entry = self
                .outbox_repository
                .insert(
                    &mut tx,
                    &NewOutboxEntry {
                        order_id: order,
                        item_id: item.id,
                        message,
                    },
                )
                .await?;

            info!(
                order_id = %order,
                item_id = %item.id,
                request_id = %entry.request_id,
                deleted,
                "enqueued renewal signing request"
            );

            enqueued += 1;
        }

        tx.commit().await?;

        info!(order_id = %order, enqueued, "order paid");

        Ok(enqueued)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Derive items from SKU tokens and create an order for them.
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrdersServiceError>;

    /// Retrieve a single order with its items.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// Mark an order paid and re-issue credentials for renewed items.
    /// Returns the number of signing requests enqueued.
    async fn on_order_paid(&self, order: OrderUuid) -> Result<u64, OrdersServiceError>;
}
