//! Billing routes: plans, checkout issuance, subscription management, and
//! the processor webhook endpoint

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use reelforge_billing::{BillingEvent, EventEnvelope, Plan, Subscription};
use reelforge_shared::SubscriptionTier;

use crate::error::ApiError;
use crate::state::AppState;

/// Request to create a checkout session
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    pub tier: String,
    pub email: String,
}

/// Response from creating a checkout session
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Pricing tiers for the public pricing page
pub async fn list_plans(State(state): State<AppState>) -> Result<Json<Vec<Plan>>, ApiError> {
    let plans = state.billing.subscriptions.list_plans().await?;
    Ok(Json(plans))
}

/// Start a subscription purchase with the payment processor.
///
/// The caller's identity arrives in the x-user-id header and is bound into
/// the session metadata; the billing webhook reconciler reads it back out of
/// subscription events to map them to a user.
pub async fn create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| ApiError::Validation("Missing or invalid x-user-id header".to_string()))?;

    if req.email.trim().is_empty() {
        return Err(ApiError::Validation("Missing tier or email".to_string()));
    }

    let tier: SubscriptionTier = req
        .tier
        .parse()
        .map_err(|_| ApiError::Validation("Invalid tier".to_string()))?;
    if !tier.is_paid() {
        return Err(ApiError::Validation("Invalid tier".to_string()));
    }

    let checkout = state
        .billing
        .checkout
        .as_ref()
        .ok_or(ApiError::ServiceUnavailable)?;

    let session = checkout
        .create_subscription_checkout(user_id, tier, req.email.trim())
        .await
        .map_err(|e| {
            tracing::error!(user_id = %user_id, tier = %tier, error = %e, "Checkout failed");
            ApiError::Internal(format!("Failed to create checkout session: {e}"))
        })?;

    Ok(Json(CheckoutResponse {
        url: session.url,
        session_id: session.session_id,
    }))
}

/// The user's subscription, if any
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Option<Subscription>>, ApiError> {
    let subscription = state.billing.subscriptions.get_subscription(user_id).await?;
    Ok(Json(subscription))
}

/// User-initiated cancellation
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .billing
        .subscriptions
        .cancel_subscription(user_id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// Processor event endpoint.
///
/// Always acknowledges a syntactically valid envelope: the processor retries
/// on non-2xx, and an event this system cannot map to a user would be
/// redelivered forever. Only an unparseable body is rejected.
pub async fn billing_webhook(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<serde_json::Value>, ApiError> {
    let envelope: EventEnvelope = serde_json::from_str(&body)
        .map_err(|e| ApiError::Validation(format!("Invalid event payload: {e}")))?;

    let event_type = envelope.event_type.clone();
    match BillingEvent::from_envelope(envelope) {
        Ok(event) => state.billing.webhooks.handle_event(event).await,
        Err(e) => {
            // A known kind whose object we cannot decode is acknowledged,
            // same as an event kind we do not handle
            tracing::warn!(
                event_type = %event_type,
                error = %e,
                "Undecodable event object - acknowledging without processing"
            );
        }
    }

    Ok(Json(json!({ "received": true })))
}
