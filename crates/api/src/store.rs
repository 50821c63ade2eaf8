//! Submission store
//!
//! Query/update contracts for submission rows. The store is handed a pool at
//! construction (no global client handle) so callers and tests control the
//! backing database.
//!
//! Concurrent writers never overwrite whole rows: `update_status` merges only
//! the fields present in the update, which is what keeps a status-only write
//! from clobbering a video_url written by a racing delivery.

use reelforge_shared::{SubmissionStatus, TemplateStyle};
use serde::Serialize;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// One user-initiated generation request
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_title: String,
    pub user_prompt: String,
    pub user_email: String,
    pub template_style: String,
    pub image_base64: Option<String>,
    pub status: SubmissionStatus,
    pub video_url: Option<String>,
    pub error_message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for creating a submission; the row enters the state machine pending
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub product_title: String,
    pub user_prompt: String,
    pub user_email: String,
    pub template_style: TemplateStyle,
    pub image_base64: Option<String>,
}

/// Partial-field status update; None leaves the stored value untouched
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: SubmissionStatus,
    pub video_url: Option<String>,
    pub error_message: Option<String>,
}

/// Durable, queryable collection of submission records
#[derive(Clone)]
pub struct SubmissionStore {
    pool: PgPool,
}

impl SubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending submission
    pub async fn create(&self, new: NewSubmission) -> Result<Submission, ApiError> {
        if new.product_title.trim().is_empty() {
            return Err(ApiError::Validation("Product title is required".to_string()));
        }
        if new.user_prompt.trim().is_empty() {
            return Err(ApiError::Validation(
                "Description/prompt is required".to_string(),
            ));
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions
                (user_id, product_title, user_prompt, user_email, template_style, image_base64)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.product_title)
        .bind(&new.user_prompt)
        .bind(&new.user_email)
        .bind(new.template_style.as_str())
        .bind(&new.image_base64)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %submission.user_id,
            "Submission created"
        );

        Ok(submission)
    }

    /// All submissions for a user, most recent first
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Submission>, ApiError> {
        let submissions = sqlx::query_as::<_, Submission>(
            "SELECT * FROM submissions WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(submissions)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Submission>, ApiError> {
        let submission =
            sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(submission)
    }

    /// Advance a submission's status, merging result fields.
    ///
    /// A terminal target is returned unchanged: the upstream engine
    /// redelivers callbacks and a redelivery must succeed without rewriting
    /// anything. A backward move between live states is rejected.
    pub async fn update_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<Submission, ApiError> {
        let current = self
            .get(id)
            .await?
            .ok_or(ApiError::NotFound("submission"))?;

        if current.status.is_terminal() {
            tracing::info!(
                submission_id = %id,
                status = %current.status,
                redelivered = %update.status,
                "Update for terminal submission - acknowledging without changes"
            );
            return Ok(current);
        }

        if !current.status.can_transition_to(update.status) {
            return Err(ApiError::PreconditionFailed(format!(
                "illegal status transition {} -> {}",
                current.status, update.status
            )));
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions
            SET status = $2,
                video_url = COALESCE($3, video_url),
                error_message = COALESCE($4, error_message),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.status)
        .bind(&update.video_url)
        .bind(&update.error_message)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(
            submission_id = %id,
            from = %current.status,
            to = %submission.status,
            "Submission status updated"
        );

        Ok(submission)
    }

    /// Delete a submission that has not started processing.
    ///
    /// The guard lives in the statement itself: once the workflow engine has
    /// claimed the work, deleting the row would orphan the render.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1 AND status = 'pending'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(submission) => Err(ApiError::PreconditionFailed(format!(
                    "cannot delete a submission in status {}",
                    submission.status
                ))),
                None => Err(ApiError::NotFound("submission")),
            };
        }

        tracing::info!(submission_id = %id, "Submission deleted");
        Ok(())
    }
}
