#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Reelforge Billing Module
//!
//! Handles Stripe integration for subscriptions and quota entitlements.
//!
//! ## Features
//!
//! - **Checkout**: Create processor-hosted checkout sessions with the user
//!   identity bound into metadata for reconciliation
//! - **Webhooks**: Reconcile processor events into subscriptions, profiles,
//!   and payment methods
//! - **Entitlements**: Daily submission quota per tier
//! - **Subscriptions**: Queries, pricing tiers, user-initiated cancellation

pub mod checkout;
pub mod client;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod subscriptions;
pub mod webhooks;

#[cfg(test)]
mod edge_case_tests;

// Checkout
pub use checkout::{CheckoutResponse, CheckoutService};

// Client
pub use client::{PriceIds, StripeClient, StripeConfig};

// Entitlement
pub use entitlement::{
    submission_limit, EntitlementService, SubmissionAllowance, UNLIMITED_SUBMISSIONS,
};

// Error
pub use error::{BillingError, BillingResult};

// Events
pub use events::{BillingEvent, EventEnvelope, PaymentMethodObject, SubscriptionObject};

// Subscriptions
pub use subscriptions::{Plan, Subscription, SubscriptionService};

// Webhooks
pub use webhooks::WebhookHandler;

use sqlx::PgPool;

/// Main billing service that combines all billing functionality.
///
/// Checkout needs Stripe credentials and is absent when they are not
/// configured; reconciliation and entitlements only need the database and
/// are always available.
pub struct BillingService {
    pub checkout: Option<CheckoutService>,
    pub entitlement: EntitlementService,
    pub subscriptions: SubscriptionService,
    pub webhooks: WebhookHandler,
}

impl BillingService {
    /// Create a billing service from environment variables
    pub fn from_env(pool: PgPool) -> Self {
        let checkout = match StripeClient::from_env() {
            Ok(stripe) => {
                tracing::info!("Stripe checkout enabled");
                Some(CheckoutService::new(stripe))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stripe not configured - checkout disabled");
                None
            }
        };

        Self {
            checkout,
            entitlement: EntitlementService::new(pool.clone()),
            subscriptions: SubscriptionService::new(pool.clone()),
            webhooks: WebhookHandler::new(pool),
        }
    }

    /// Create a billing service with explicit Stripe config
    pub fn new(config: StripeConfig, pool: PgPool) -> Self {
        let stripe = StripeClient::new(config);

        Self {
            checkout: Some(CheckoutService::new(stripe)),
            entitlement: EntitlementService::new(pool.clone()),
            subscriptions: SubscriptionService::new(pool.clone()),
            webhooks: WebhookHandler::new(pool),
        }
    }
}
