//! Submission routes: create, list, delete, entitlement, and the dashboard
//! notification stream

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use reelforge_billing::entitlement::submission_limit;
use reelforge_shared::{SubscriptionTier, TemplateStyle};

use crate::error::ApiError;
use crate::poller::{SubmissionPoller, POLL_INTERVAL};
use crate::state::AppState;
use crate::store::{NewSubmission, Submission};

/// Request to create a submission
#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    pub product_title: String,
    pub user_prompt: String,
    #[serde(default)]
    pub user_email: String,
    #[serde(default)]
    pub template_style: TemplateStyle,
    #[serde(default)]
    pub image_base64: Option<String>,
}

/// Entitlement view for the dashboard quota display
#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    pub tier: SubscriptionTier,
    pub allowed: bool,
    pub remaining: i64,
    pub limit: i64,
}

/// Create a submission and notify the workflow engine.
///
/// The quota gate runs before any write; a blocked create leaves no row
/// behind. The generation trigger runs after the row exists and its failure
/// is not the user's problem.
pub async fn create_submission(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let tier = state
        .billing
        .subscriptions
        .tier_for_user(user_id)
        .await
        .unwrap_or_default();

    let allowance = state
        .billing
        .entitlement
        .check_submission_allowed(user_id, tier)
        .await;
    if !allowance.allowed {
        return Err(ApiError::QuotaExceeded {
            remaining: allowance.remaining.max(0),
        });
    }

    let submission = state
        .store
        .create(NewSubmission {
            user_id,
            product_title: req.product_title,
            user_prompt: req.user_prompt,
            user_email: req.user_email,
            template_style: req.template_style,
            image_base64: req.image_base64,
        })
        .await?;

    state.generation.notify_submission(&submission).await;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// List the user's submissions, most recent first
pub async fn list_submissions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let submissions = state.store.list_for_user(user_id).await?;
    Ok(Json(submissions))
}

/// Delete a pending submission
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current quota state for the dashboard progress display
pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EntitlementResponse>, ApiError> {
    let tier = state
        .billing
        .subscriptions
        .tier_for_user(user_id)
        .await
        .unwrap_or_default();

    let allowance = state
        .billing
        .entitlement
        .check_submission_allowed(user_id, tier)
        .await;

    Ok(Json(EntitlementResponse {
        tier,
        allowed: allowance.allowed,
        remaining: allowance.remaining,
        limit: submission_limit(tier),
    }))
}

/// Server-push stream of completion notifications.
///
/// A poller task is spawned per connection and owned by the stream: when the
/// client disconnects the stream drops and the poll loop is aborted with it.
pub async fn submission_events(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel(16);
    let handle = SubmissionPoller::spawn(state.store.clone(), user_id, POLL_INTERVAL, tx);

    let stream = ReceiverStream::new(rx).map(move |notice| -> Result<Event, Infallible> {
        // The poller handle lives as long as the stream
        let _poller = &handle;
        match Event::default().event("completion").json_data(&notice) {
            Ok(event) => Ok(event),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode completion notice");
                Ok(Event::default()
                    .event("completion")
                    .data(notice.product_title))
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
