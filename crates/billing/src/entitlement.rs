//! Entitlement Calculator
//!
//! Answers "may this user submit another generation request right now, and
//! how many are left?" from their tier and today's usage. Read-only and safe
//! to call repeatedly: the same computation backs both the quota gate on
//! submission and the dashboard's remaining-count display.
//!
//! The usage window resets at the server's local midnight, not the user's
//! timezone and not a calendar month.

use reelforge_shared::SubscriptionTier;
use serde::Serialize;
use sqlx::PgPool;
use time::{OffsetDateTime, Time};
use uuid::Uuid;

use crate::error::BillingResult;

/// Sentinel meaning "no quota ceiling"
pub const UNLIMITED_SUBMISSIONS: i64 = -1;

/// Daily submission ceiling for a tier
pub fn submission_limit(tier: SubscriptionTier) -> i64 {
    match tier {
        SubscriptionTier::Starter => 5,
        SubscriptionTier::Creator => 50,
        SubscriptionTier::Pro => UNLIMITED_SUBMISSIONS,
    }
}

/// The quota window boundary: midnight of the given instant's day
pub fn start_of_today(now: OffsetDateTime) -> OffsetDateTime {
    now.replace_time(Time::MIDNIGHT)
}

/// Remaining quota from a ceiling and a usage count, clamped at zero
pub fn remaining_from_count(limit: i64, used: i64) -> i64 {
    if limit == UNLIMITED_SUBMISSIONS {
        return UNLIMITED_SUBMISSIONS;
    }
    (limit - used).max(0)
}

/// Outcome of the fail-closed quota gate
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubmissionAllowance {
    pub allowed: bool,
    pub remaining: i64,
}

/// Quota computation over the submission store
#[derive(Clone)]
pub struct EntitlementService {
    pool: PgPool,
}

impl EntitlementService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Submissions left today for this user; -1 means unlimited
    pub async fn remaining_submissions(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> BillingResult<i64> {
        let limit = submission_limit(tier);
        if limit == UNLIMITED_SUBMISSIONS {
            return Ok(UNLIMITED_SUBMISSIONS);
        }

        // Local midnight; UTC midnight when the local offset is indeterminate
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let since = start_of_today(now);

        let (used,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM submissions WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(remaining_from_count(limit, used))
    }

    /// Fail-closed quota gate: any underlying failure reports not-allowed
    /// rather than letting a submission through unmetered.
    pub async fn check_submission_allowed(
        &self,
        user_id: Uuid,
        tier: SubscriptionTier,
    ) -> SubmissionAllowance {
        match self.remaining_submissions(user_id, tier).await {
            Ok(remaining) => SubmissionAllowance {
                allowed: remaining > 0 || remaining == UNLIMITED_SUBMISSIONS,
                remaining,
            },
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Quota check failed - denying");
                SubmissionAllowance {
                    allowed: false,
                    remaining: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn limits_per_tier() {
        assert_eq!(submission_limit(SubscriptionTier::Starter), 5);
        assert_eq!(submission_limit(SubscriptionTier::Creator), 50);
        assert_eq!(
            submission_limit(SubscriptionTier::Pro),
            UNLIMITED_SUBMISSIONS
        );
    }

    #[test]
    fn window_starts_at_midnight_of_the_same_day() {
        let now = datetime!(2025-03-14 17:45:12.5 +02:00);
        let boundary = start_of_today(now);
        assert_eq!(boundary, datetime!(2025-03-14 00:00:00 +02:00));

        // Just past midnight still belongs to the new day
        let early = datetime!(2025-03-15 00:00:01 +02:00);
        assert_eq!(start_of_today(early), datetime!(2025-03-15 00:00:00 +02:00));
    }

    #[test]
    fn remaining_clamps_at_zero() {
        assert_eq!(remaining_from_count(5, 0), 5);
        assert_eq!(remaining_from_count(5, 3), 2);
        assert_eq!(remaining_from_count(5, 5), 0);
        assert_eq!(remaining_from_count(5, 9), 0);
    }

    #[test]
    fn unlimited_ignores_usage() {
        assert_eq!(
            remaining_from_count(UNLIMITED_SUBMISSIONS, 10_000),
            UNLIMITED_SUBMISSIONS
        );
    }
}
