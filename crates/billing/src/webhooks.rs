//! Billing webhook reconciliation
//!
//! Merges processor events into subscription, profile, and payment method
//! rows. Deliveries may arrive duplicated or out of order; every write here
//! is an upsert or a keyed delete so redelivery converges to the same state.
//!
//! Handler failures are logged and never propagated: the processor treats a
//! non-2xx response as "retry", and an event this system cannot interpret
//! would otherwise be retried forever.

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::events::{BillingEvent, PaymentMethodObject, SubscriptionObject};

/// Webhook handler for processor events
#[derive(Clone)]
pub struct WebhookHandler {
    pool: PgPool,
}

impl WebhookHandler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Dispatch a decoded event, isolating each handler's failure.
    ///
    /// The caller acknowledges the delivery regardless of the outcome here.
    pub async fn handle_event(&self, event: BillingEvent) {
        match event {
            BillingEvent::SubscriptionCreated(sub) | BillingEvent::SubscriptionUpdated(sub) => {
                if let Err(e) = self.reconcile_subscription(&sub).await {
                    tracing::error!(
                        subscription_id = %sub.id,
                        error = %e,
                        "Failed to reconcile subscription event"
                    );
                }
            }
            BillingEvent::SubscriptionDeleted(sub) => {
                if let Err(e) = self.reconcile_subscription_deleted(&sub).await {
                    tracing::error!(
                        subscription_id = %sub.id,
                        error = %e,
                        "Failed to reconcile subscription deletion"
                    );
                }
            }
            BillingEvent::PaymentMethodAttached(pm) => {
                if let Err(e) = self.store_payment_method(&pm).await {
                    tracing::error!(
                        payment_method_id = %pm.id,
                        error = %e,
                        "Failed to store payment method"
                    );
                }
            }
            BillingEvent::PaymentMethodDetached(pm) => {
                if let Err(e) = self.remove_payment_method(&pm).await {
                    tracing::error!(
                        payment_method_id = %pm.id,
                        error = %e,
                        "Failed to remove payment method"
                    );
                }
            }
            BillingEvent::Unrecognized { event_type } => {
                // Logged so new event kinds that may need handlers are visible
                tracing::info!(event_type = %event_type, "Unhandled processor event type");
            }
        }
    }

    /// Upsert the subscription keyed on user_id, then sync the profile tier.
    ///
    /// An event without a user id or tier in its metadata did not originate
    /// from our checkout flow; it is ignored rather than failed so the
    /// processor does not redeliver it.
    async fn reconcile_subscription(&self, sub: &SubscriptionObject) -> BillingResult<()> {
        let (Some(user_id), Some(tier)) = (sub.user_id(), sub.tier()) else {
            tracing::debug!(
                subscription_id = %sub.id,
                "Subscription event without user_id/tier metadata - ignoring"
            );
            return Ok(());
        };

        let status = if sub.status.as_deref() == Some("active") {
            "active"
        } else {
            "cancelled"
        };

        let period_start = sub
            .current_period_start
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());
        let period_end = sub
            .current_period_end
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok());

        sqlx::query(
            r#"
            INSERT INTO subscriptions
                (user_id, tier, status, stripe_subscription_id,
                 current_period_start, current_period_end)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE SET
                tier = EXCLUDED.tier,
                status = EXCLUDED.status,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(tier.as_str())
        .bind(status)
        .bind(&sub.id)
        .bind(period_start)
        .bind(period_end)
        .execute(&self.pool)
        .await?;

        self.sync_profile_tier(user_id, tier.as_str()).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %sub.id,
            tier = %tier,
            status = %status,
            "Subscription reconciled"
        );

        Ok(())
    }

    /// Cancel the user's subscription and fall back to the free tier.
    ///
    /// The row is kept, never hard-deleted. Access already granted through
    /// current_period_end is not revoked here.
    async fn reconcile_subscription_deleted(&self, sub: &SubscriptionObject) -> BillingResult<()> {
        let Some(user_id) = sub.user_id() else {
            tracing::debug!(
                subscription_id = %sub.id,
                "Subscription deletion without user_id metadata - ignoring"
            );
            return Ok(());
        };

        sqlx::query(
            "UPDATE subscriptions SET status = 'cancelled', updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.sync_profile_tier(user_id, "starter").await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %sub.id,
            "Subscription cancelled, profile downgraded to starter"
        );

        Ok(())
    }

    /// Insert a stored payment method. The unique constraint on the external
    /// id makes redelivery a no-op.
    async fn store_payment_method(&self, pm: &PaymentMethodObject) -> BillingResult<()> {
        let Some(user_id) = pm.customer.as_deref().and_then(|c| Uuid::parse_str(c).ok()) else {
            tracing::debug!(
                payment_method_id = %pm.id,
                customer = ?pm.customer,
                "Payment method event without a mappable user - ignoring"
            );
            return Ok(());
        };

        let card = pm.card.clone().unwrap_or_default();

        let result = sqlx::query(
            r#"
            INSERT INTO payment_methods
                (user_id, stripe_payment_method_id, type, last_four, expiry_month, expiry_year, is_default)
            VALUES ($1, $2, 'card', $3, $4, $5, FALSE)
            ON CONFLICT (stripe_payment_method_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(&pm.id)
        .bind(card.last4.unwrap_or_default())
        .bind(card.exp_month)
        .bind(card.exp_year)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(payment_method_id = %pm.id, "Payment method already stored");
        } else {
            tracing::info!(user_id = %user_id, payment_method_id = %pm.id, "Payment method stored");
        }

        Ok(())
    }

    /// Delete by external id; deleting a row that is already gone is a no-op
    async fn remove_payment_method(&self, pm: &PaymentMethodObject) -> BillingResult<()> {
        sqlx::query("DELETE FROM payment_methods WHERE stripe_payment_method_id = $1")
            .bind(&pm.id)
            .execute(&self.pool)
            .await?;

        tracing::info!(payment_method_id = %pm.id, "Payment method removed");
        Ok(())
    }

    async fn sync_profile_tier(&self, user_id: Uuid, tier: &str) -> BillingResult<()> {
        sqlx::query("UPDATE profiles SET subscription_tier = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(tier)
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::Database(e.to_string()))?;
        Ok(())
    }
}
