//! Stripe client wrapper and configuration

use std::sync::Arc;

use reelforge_shared::SubscriptionTier;

use crate::error::{BillingError, BillingResult};

/// Stripe price ids for the purchasable tiers
#[derive(Debug, Clone, Default)]
pub struct PriceIds {
    pub creator: Option<String>,
    pub pro: Option<String>,
}

/// Stripe configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Where the processor sends the buyer after checkout
    pub success_url: String,
    pub cancel_url: String,
    pub price_ids: PriceIds,
}

impl StripeConfig {
    pub fn from_env() -> BillingResult<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Config("STRIPE_SECRET_KEY not set".to_string()))?;

        let base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            secret_key,
            success_url: std::env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
                format!("{base_url}/success?session_id={{CHECKOUT_SESSION_ID}}")
            }),
            cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| format!("{base_url}/pricing")),
            price_ids: PriceIds {
                creator: std::env::var("STRIPE_CREATOR_PRICE_ID").ok(),
                pro: std::env::var("STRIPE_PRO_PRICE_ID").ok(),
            },
        })
    }

    /// Price id for a purchasable tier; starter has no price
    pub fn price_id_for_tier(&self, tier: SubscriptionTier) -> Option<&str> {
        match tier {
            SubscriptionTier::Starter => None,
            SubscriptionTier::Creator => self.price_ids.creator.as_deref(),
            SubscriptionTier::Pro => self.price_ids.pro.as_deref(),
        }
    }
}

/// Shared Stripe API client
#[derive(Clone)]
pub struct StripeClient {
    client: stripe::Client,
    config: Arc<StripeConfig>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let client = stripe::Client::new(config.secret_key.clone());
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn from_env() -> BillingResult<Self> {
        Ok(Self::new(StripeConfig::from_env()?))
    }

    pub fn inner(&self) -> &stripe::Client {
        &self.client
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}
