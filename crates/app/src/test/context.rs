//! Test context for service-level integration tests.

use std::{sync::Arc, time::Duration};

use crate::{
    bus::{BusError, BusTopics, MemoryBus, MessageWriter},
    correlator::SigningResultCorrelator,
    database::Db,
    domain::{
        credentials::{DEFAULT_RETRY_WINDOW, PgCredentialsService},
        orders::PgOrdersService,
    },
    macaroon::{RootKey, TokenValidator},
    outbox::OutboxPublisher,
    signing::CodecRegistry,
};

use super::{db::TestDb, helpers};

pub(crate) const MERCHANT: &str = "brave.com";

pub struct TestContext {
    pub db: TestDb,
    pub orders: PgOrdersService,
    pub credentials: PgCredentialsService,
    pub bus: MemoryBus,
    pub topics: BusTopics,
    pub codecs: Arc<CodecRegistry>,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = test_db.app_db();

        let validator = Arc::new(TokenValidator::new(
            [],
            Some(RootKey::from(helpers::ROOT_KEY)),
        ));

        let topics = BusTopics {
            dead_letters: Some(helpers::DEAD_LETTER_TOPIC.to_string()),
            ..BusTopics::default()
        };

        Self {
            orders: PgOrdersService::new(db.clone(), validator, MERCHANT.to_string()),
            credentials: PgCredentialsService::new(db, DEFAULT_RETRY_WINDOW),
            bus: MemoryBus::new(),
            codecs: Arc::new(
                CodecRegistry::for_topics(&topics).expect("Failed to register test codecs"),
            ),
            topics,
            db: test_db,
        }
    }

    /// Application handle on the per-test database.
    pub fn app_db(&self) -> Db {
        self.db.app_db()
    }

    /// Outbox publisher writing signing requests through `writer`.
    pub fn publisher(&self, writer: Arc<dyn MessageWriter>) -> OutboxPublisher {
        OutboxPublisher::new(
            self.app_db(),
            writer,
            Arc::clone(&self.codecs),
            self.topics.signing_requests.clone(),
            10,
        )
    }

    /// Correlator consuming signing results from the in-memory bus.
    pub fn correlator(&self) -> Result<SigningResultCorrelator, BusError> {
        let reader = self.bus.reader(&self.topics.signing_results)?;

        Ok(SigningResultCorrelator::new(
            self.app_db(),
            Arc::new(reader),
            Arc::new(self.bus.writer()),
            Arc::clone(&self.codecs),
            self.topics.clone(),
            Duration::from_millis(10),
        ))
    }
}
