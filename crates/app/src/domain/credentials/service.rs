//! Credentials service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::{
    database::Db,
    domain::{
        credentials::{
            errors::CredentialsServiceError,
            models::{CredentialState, Credentials, TimeLimitedV2Credential},
            plan::plan_signing_request,
            repositories::{
                PgSingleUseCredentialsRepository, PgTimeLimitedV2CredentialsRepository,
            },
        },
        issuers::{PgIssuersRepository, models::DEFAULT_ISSUER_COHORT},
        orders::{
            PgOrderItemsRepository, PgOrdersRepository,
            models::{CredentialType, Order, OrderItem, OrderItemUuid, OrderUuid},
        },
    },
    intervals::{IntervalError, is_still_valid},
    outbox::{PgOutboxRepository, models::NewOutboxEntry},
    signing::RequestUuid,
};

/// Completed requests averaged for the retry hint.
pub const DEFAULT_RETRY_WINDOW: u32 = 10;

/// Seconds a poller should wait, from the mean signing latency. Never less
/// than one second.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn retry_after_seconds(average_seconds: Option<f64>) -> u64 {
    match average_seconds {
        Some(average) if average.is_finite() && average > 1.0 => average.ceil() as u64,
        _ => 1,
    }
}

/// Rows of `item` still redeemable at `now`.
fn still_valid(
    item: &OrderItem,
    rows: Vec<TimeLimitedV2Credential>,
    now: Timestamp,
) -> Result<Vec<TimeLimitedV2Credential>, IntervalError> {
    let period = item.credential_period()?;
    let overlap = item.issuer_config.overlap;

    let mut valid = Vec::with_capacity(rows.len());

    for row in rows {
        if is_still_valid(row.valid_to, &period, overlap, now)? {
            valid.push(row);
        }
    }

    Ok(valid)
}

#[derive(Debug, Clone)]
pub struct PgCredentialsService {
    db: Db,
    retry_window: u32,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    issuers_repository: PgIssuersRepository,
    outbox_repository: PgOutboxRepository,
    single_use_repository: PgSingleUseCredentialsRepository,
    time_limited_v2_repository: PgTimeLimitedV2CredentialsRepository,
}

impl PgCredentialsService {
    #[must_use]
    pub fn new(db: Db, retry_window: u32) -> Self {
        Self {
            db,
            retry_window: retry_window.max(1),
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            issuers_repository: PgIssuersRepository::new(),
            outbox_repository: PgOutboxRepository::new(),
            single_use_repository: PgSingleUseCredentialsRepository::new(),
            time_limited_v2_repository: PgTimeLimitedV2CredentialsRepository::new(),
        }
    }

    async fn load_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<(Order, OrderItem), CredentialsServiceError> {
        let order = self.orders_repository.get_order(tx, order).await?;

        let item = self
            .items_repository
            .get_items(tx, order.id)
            .await?
            .into_iter()
            .find(|candidate| candidate.id == item)
            .ok_or(CredentialsServiceError::NotFound)?;

        Ok((order, item))
    }

    async fn pending(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<CredentialState, CredentialsServiceError> {
        let average = self
            .outbox_repository
            .average_signing_seconds(tx, self.retry_window)
            .await?;

        Ok(CredentialState::Pending {
            retry_after_seconds: retry_after_seconds(average),
        })
    }

    /// Reject a submission when the item already holds, or is waiting for,
    /// credentials.
    async fn ensure_not_issued(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: &OrderItem,
        now: Timestamp,
    ) -> Result<(), CredentialsServiceError> {
        let issued = match item.credential_type {
            CredentialType::SingleUse => self
                .single_use_repository
                .get(tx, item.order_id, item.id)
                .await?
                .is_some(),
            CredentialType::TimeLimitedV2 => {
                let in_flight = self
                    .outbox_repository
                    .latest_for_item(tx, item.order_id, item.id)
                    .await?
                    .is_some_and(|entry| !entry.is_completed());

                let rows = self
                    .time_limited_v2_repository
                    .list(tx, item.order_id, item.id)
                    .await?;

                in_flight || !still_valid(item, rows, now)?.is_empty()
            }
            CredentialType::TimeLimited => {
                return Err(CredentialsServiceError::UnsupportedCredentialType(
                    item.credential_type,
                ));
            }
        };

        if issued {
            return Err(CredentialsServiceError::AlreadyExists);
        }

        Ok(())
    }
}

#[async_trait]
impl CredentialsService for PgCredentialsService {
    async fn create_credentials(
        &self,
        order: OrderUuid,
        item: OrderItemUuid,
        blinded_creds: Vec<String>,
    ) -> Result<RequestUuid, CredentialsServiceError> {
        let now = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let (order, item) = self.load_item(&mut tx, order, item).await?;

        if !order.is_paid(now) {
            return Err(CredentialsServiceError::OrderNotPaid);
        }

        self.ensure_not_issued(&mut tx, &item, now).await?;

        let issuer = self
            .issuers_repository
            .get_or_create(
                &mut tx,
                &item.issuer_name(&order.merchant_id),
                DEFAULT_ISSUER_COHORT,
            )
            .await?;

        let message = plan_signing_request(&item, &issuer, blinded_creds, now)?;

        if item.credential_type == CredentialType::SingleUse {
            let blinded = message
                .data
                .first()
                .map(|signing_order| signing_order.blinded_tokens.as_slice())
                .unwrap_or_default();

            self.single_use_repository
                .insert_pending(&mut tx, order.id, item.id, issuer.id, blinded)
                .await?;
        }

        let entry = self
            .outbox_repository
            .insert(
                &mut tx,
                &NewOutboxEntry {
                    order_id: order.id,
                    item_id: item.id,
                    message,
                },
            )
            .await?;

        tx.commit().await?;

        info!(
            order_id = %order.id,
            item_id = %item.id,
            issuer_id = %issuer.id,
            request_id = %entry.request_id,
            signing_orders = entry.message.data.len(),
            "enqueued signing request"
        );

        Ok(entry.request_id)
    }

    async fn get_credentials(
        &self,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<CredentialState, CredentialsServiceError> {
        let mut tx = self.db.begin().await?;

        let (order, item) = self.load_item(&mut tx, order, item).await?;

        let state = match item.credential_type {
            CredentialType::SingleUse => {
                match self
                    .single_use_repository
                    .get(&mut tx, order.id, item.id)
                    .await?
                {
                    None => CredentialState::Absent,
                    Some(credential) if credential.is_signed() => {
                        CredentialState::Ready(Credentials::SingleUse(credential))
                    }
                    Some(_) => self.pending(&mut tx).await?,
                }
            }
            CredentialType::TimeLimitedV2 => {
                match self
                    .outbox_repository
                    .latest_for_item(&mut tx, order.id, item.id)
                    .await?
                {
                    None => CredentialState::Absent,
                    Some(entry) if !entry.is_completed() => self.pending(&mut tx).await?,
                    Some(_) => {
                        let rows = self
                            .time_limited_v2_repository
                            .list(&mut tx, order.id, item.id)
                            .await?;

                        CredentialState::Ready(Credentials::TimeLimitedV2(still_valid(
                            &item,
                            rows,
                            Timestamp::now(),
                        )?))
                    }
                }
            }
            CredentialType::TimeLimited => {
                return Err(CredentialsServiceError::UnsupportedCredentialType(
                    item.credential_type,
                ));
            }
        };

        tx.commit().await?;

        Ok(state)
    }
}

#[automock]
#[async_trait]
pub trait CredentialsService: Send + Sync {
    /// Submit blinded tokens for signing. Returns the signing request id.
    async fn create_credentials(
        &self,
        order: OrderUuid,
        item: OrderItemUuid,
        blinded_creds: Vec<String>,
    ) -> Result<RequestUuid, CredentialsServiceError>;

    /// Current credential state of an order item.
    async fn get_credentials(
        &self,
        order: OrderUuid,
        item: OrderItemUuid,
    ) -> Result<CredentialState, CredentialsServiceError>;
}
