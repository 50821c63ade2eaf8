//! HTTP routes

pub mod billing;
pub mod completion;
pub mod submissions;

use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::state::AppState;

/// Build the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Dashboard
        .route(
            "/api/users/{user_id}/submissions",
            get(submissions::list_submissions).post(submissions::create_submission),
        )
        .route(
            "/api/submissions/{id}",
            delete(submissions::delete_submission),
        )
        .route(
            "/api/users/{user_id}/entitlement",
            get(submissions::get_entitlement),
        )
        .route(
            "/api/users/{user_id}/events",
            get(submissions::submission_events),
        )
        // Billing
        .route("/api/plans", get(billing::list_plans))
        .route("/api/checkout", post(billing::create_checkout))
        .route(
            "/api/users/{user_id}/subscription",
            get(billing::get_subscription),
        )
        .route(
            "/api/users/{user_id}/subscription/cancel",
            post(billing::cancel_subscription),
        )
        // Webhooks from external systems
        .route("/webhooks/billing", post(billing::billing_webhook))
        .route("/webhooks/completion", post(completion::completion_webhook))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
