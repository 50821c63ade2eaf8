//! Checkout session issuance
//!
//! Starts a subscription purchase with the payment processor. The buyer's
//! user id and tier are bound into the session metadata so the webhook
//! reconciler can map the resulting subscription events back to a user.

use std::collections::HashMap;

use reelforge_shared::SubscriptionTier;
use stripe::{
    CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, CreateCheckoutSessionLineItems,
};
use uuid::Uuid;

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};

/// Result of creating a checkout session
#[derive(Debug, Clone)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// Service for creating processor-hosted checkout sessions
#[derive(Clone)]
pub struct CheckoutService {
    stripe: StripeClient,
}

impl CheckoutService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// Create a subscription-mode checkout session for a paid tier
    pub async fn create_subscription_checkout(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
        email: &str,
    ) -> BillingResult<CheckoutResponse> {
        if !tier.is_paid() {
            return Err(BillingError::InvalidTier(tier.to_string()));
        }

        let price_id = self
            .stripe
            .config()
            .price_id_for_tier(tier)
            .ok_or_else(|| BillingError::InvalidTier(tier.to_string()))?
            .to_string();

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user_id.to_string());
        metadata.insert("tier".to_string(), tier.to_string());

        let config = self.stripe.config();
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Subscription);
        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price: Some(price_id),
            quantity: Some(1),
            ..Default::default()
        }]);
        params.success_url = Some(&config.success_url);
        params.cancel_url = Some(&config.cancel_url);
        params.customer_email = Some(email);
        params.metadata = Some(metadata);

        let session = CheckoutSession::create(self.stripe.inner(), params).await?;

        tracing::info!(
            user_id = %user_id,
            tier = %tier,
            session_id = %session.id,
            "Created checkout session"
        );

        Ok(CheckoutResponse {
            session_id: session.id.to_string(),
            url: session.url,
        })
    }
}
