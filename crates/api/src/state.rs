//! Application state

use std::sync::Arc;

use sqlx::PgPool;

use reelforge_billing::BillingService;

use crate::config::Config;
use crate::generation::GenerationClient;
use crate::store::SubmissionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub store: SubmissionStore,
    pub billing: Arc<BillingService>,
    pub generation: GenerationClient,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let billing = Arc::new(BillingService::from_env(pool.clone()));

        let http_client = reqwest::Client::new();
        let generation =
            GenerationClient::new(http_client, config.generation_webhook_url.clone());
        if config.generation_webhook_url.is_none() {
            tracing::warn!("Generation webhook not configured (missing GENERATION_WEBHOOK_URL)");
        }

        if config.completion_webhook_secret.is_none() {
            tracing::warn!(
                "Completion webhook secret not configured - completion callbacks are unauthenticated"
            );
        }

        Self {
            store: SubmissionStore::new(pool.clone()),
            pool,
            config,
            billing,
            generation,
        }
    }
}
