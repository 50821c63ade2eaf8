//! Completion webhook: the generation engine's callback
//!
//! Unlike the billing endpoint, malformed requests here are rejected rather
//! than acknowledged: the engine relies on a truthful response to decide
//! whether to retry, and silently dropping a callback would strand the
//! submission in pending forever.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use reelforge_shared::SubmissionStatus;

use crate::config::Config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::store::StatusUpdate;

/// The engine's sentinel for "finished without error"
const NO_ERROR_SENTINEL: &str = "Success";

/// Callback payload from the generation engine
#[derive(Debug, Deserialize)]
pub struct CompletionCallback {
    #[serde(default)]
    pub submission_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: Uuid,
    pub status: SubmissionStatus,
}

/// Apply a completion callback to the submission it names
pub async fn completion_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<CompletionResponse>, ApiError> {
    verify_shared_secret(&state.config, &headers)?;

    let payload: CompletionCallback = serde_json::from_str(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid JSON in request body: {e}")))?;

    let submission_id = payload
        .submission_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("submission_id is required".to_string()))?;
    let submission_id = Uuid::parse_str(submission_id)
        .map_err(|_| ApiError::Validation("submission_id is not a valid id".to_string()))?;

    let update = status_update_from_callback(&payload)?;

    let submission = state.store.update_status(submission_id, update).await?;

    Ok(Json(CompletionResponse {
        success: true,
        message: "Submission status updated successfully".to_string(),
        submission_id: submission.id,
        status: submission.status,
    }))
}

/// Translate the callback into a partial-field update.
///
/// A callback without a status means the engine has picked up the work:
/// processing. The "Success" error_message is the engine saying nothing went
/// wrong and is not stored.
fn status_update_from_callback(payload: &CompletionCallback) -> Result<StatusUpdate, ApiError> {
    let status = match payload.status.as_deref() {
        None => SubmissionStatus::Processing,
        Some(s) => s
            .parse()
            .map_err(|_| ApiError::Validation(format!("unknown status: {s}")))?,
    };

    Ok(StatusUpdate {
        status,
        video_url: payload.video_url.clone().filter(|u| !u.is_empty()),
        error_message: payload
            .error_message
            .clone()
            .filter(|m| !m.is_empty() && m.as_str() != NO_ERROR_SENTINEL),
    })
}

/// Reject callers without the shared secret, when one is configured
fn verify_shared_secret(config: &Config, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(secret) = &config.completion_webhook_secret else {
        return Ok(());
    };

    let provided = headers
        .get("x-webhook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if bool::from(provided.as_bytes().ct_eq(secret.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn callback(body: serde_json::Value) -> CompletionCallback {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn missing_status_defaults_to_processing() {
        let update = status_update_from_callback(&callback(serde_json::json!({
            "submission_id": "0b8a3f0e-2f7d-4f7c-9a5e-111111111111",
        })))
        .unwrap();
        assert_eq!(update.status, SubmissionStatus::Processing);
        assert!(update.video_url.is_none());
        assert!(update.error_message.is_none());
    }

    #[test]
    fn completed_with_url_carries_both_fields() {
        let update = status_update_from_callback(&callback(serde_json::json!({
            "submission_id": "0b8a3f0e-2f7d-4f7c-9a5e-111111111111",
            "status": "completed",
            "video_url": "https://cdn.example.com/v/1.mp4",
        })))
        .unwrap();
        assert_eq!(update.status, SubmissionStatus::Completed);
        assert_eq!(
            update.video_url.as_deref(),
            Some("https://cdn.example.com/v/1.mp4")
        );
    }

    #[test]
    fn success_sentinel_is_not_stored_as_an_error() {
        let update = status_update_from_callback(&callback(serde_json::json!({
            "submission_id": "x",
            "status": "completed",
            "error_message": "Success",
        })))
        .unwrap();
        assert!(update.error_message.is_none());
    }

    #[test]
    fn real_error_message_is_kept() {
        let update = status_update_from_callback(&callback(serde_json::json!({
            "submission_id": "x",
            "status": "failed",
            "error_message": "render timed out",
        })))
        .unwrap();
        assert_eq!(update.error_message.as_deref(), Some("render timed out"));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result = status_update_from_callback(&callback(serde_json::json!({
            "submission_id": "x",
            "status": "exploded",
        })));
        assert!(matches!(result, Err(ApiError::Validation(_))));
    }

    fn config_with_secret(secret: Option<&str>) -> Config {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            generation_webhook_url: None,
            completion_webhook_secret: secret.map(str::to_string),
        }
    }

    #[test]
    fn secret_check_passes_when_unconfigured() {
        let headers = HeaderMap::new();
        assert!(verify_shared_secret(&config_with_secret(None), &headers).is_ok());
    }

    #[test]
    fn secret_check_enforces_exact_match() {
        let config = config_with_secret(Some("s3cret"));

        let mut ok = HeaderMap::new();
        ok.insert("x-webhook-secret", "s3cret".parse().unwrap());
        assert!(verify_shared_secret(&config, &ok).is_ok());

        let mut wrong = HeaderMap::new();
        wrong.insert("x-webhook-secret", "nope".parse().unwrap());
        assert!(matches!(
            verify_shared_secret(&config, &wrong),
            Err(ApiError::Unauthorized)
        ));

        let missing = HeaderMap::new();
        assert!(matches!(
            verify_shared_secret(&config, &missing),
            Err(ApiError::Unauthorized)
        ));
    }
}
