//! Subscription queries and user-initiated cancellation

use reelforge_shared::SubscriptionTier;
use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::BillingResult;

/// One user's billing relationship; at most one row per user
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: String,
    pub status: String,
    pub stripe_subscription_id: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_start: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub current_period_end: Option<OffsetDateTime>,
}

/// Static pricing tier reference row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Plan {
    pub tier: String,
    pub price_cents: i32,
    pub video_limit: i32,
    pub stripe_product_id: Option<String>,
    pub stripe_price_id: Option<String>,
}

/// Subscription read/cancel operations
#[derive(Clone)]
pub struct SubscriptionService {
    pool: PgPool,
}

impl SubscriptionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The user's subscription, if any
    pub async fn get_subscription(&self, user_id: Uuid) -> BillingResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, user_id, tier, status, stripe_subscription_id,
                   current_period_start, current_period_end
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    /// The user's current tier from the denormalized profile projection.
    ///
    /// A missing profile row means the user never subscribed: starter.
    pub async fn tier_for_user(&self, user_id: Uuid) -> BillingResult<SubscriptionTier> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT subscription_tier FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .and_then(|(tier,)| tier.parse().ok())
            .unwrap_or_default())
    }

    /// User-initiated cancellation: mirrors the subscription-deleted event
    pub async fn cancel_subscription(&self, user_id: Uuid) -> BillingResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET status = 'cancelled', updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "UPDATE profiles SET subscription_tier = 'starter', updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user_id, "Subscription cancelled by user");
        Ok(())
    }

    /// Pricing tiers for display, cheapest first
    pub async fn list_plans(&self) -> BillingResult<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(
            r#"
            SELECT tier, price_cents, video_limit, stripe_product_id, stripe_price_id
            FROM pricing_tiers
            ORDER BY price_cents ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(plans)
    }
}
