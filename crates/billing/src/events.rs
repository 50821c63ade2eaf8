//! Processor event envelope decoding
//!
//! Incoming webhook payloads use the processor's generic envelope
//! `{type, data: {object}}`. Rather than carrying the full Stripe type
//! surface for five event kinds, the envelope is decoded into a local tagged
//! union with an explicit `Unrecognized` variant for everything else.

use std::collections::HashMap;

use reelforge_shared::SubscriptionTier;
use serde::Deserialize;
use uuid::Uuid;

/// Generic processor event envelope
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// Subscription payload carried by subscription lifecycle events
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionObject {
    /// User identity bound into the session metadata at checkout time
    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata
            .get("user_id")
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    pub fn tier(&self) -> Option<SubscriptionTier> {
        self.metadata.get("tier").and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub last4: Option<String>,
    #[serde(default)]
    pub exp_month: Option<i32>,
    #[serde(default)]
    pub exp_year: Option<i32>,
}

/// Payment method payload carried by attach/detach events
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentMethodObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

/// The event kinds this system reconciles
#[derive(Debug)]
pub enum BillingEvent {
    SubscriptionCreated(SubscriptionObject),
    SubscriptionUpdated(SubscriptionObject),
    SubscriptionDeleted(SubscriptionObject),
    PaymentMethodAttached(PaymentMethodObject),
    PaymentMethodDetached(PaymentMethodObject),
    /// Delivered but not handled; acknowledged without side effects
    Unrecognized { event_type: String },
}

impl BillingEvent {
    /// Decode an envelope into a typed event.
    ///
    /// Fails only when the `data.object` of a *known* event kind does not
    /// decode; unknown kinds always succeed as `Unrecognized`.
    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, serde_json::Error> {
        let EventEnvelope { event_type, data } = envelope;
        match event_type.as_str() {
            "customer.subscription.created" => {
                Ok(BillingEvent::SubscriptionCreated(serde_json::from_value(
                    data.object,
                )?))
            }
            "customer.subscription.updated" => {
                Ok(BillingEvent::SubscriptionUpdated(serde_json::from_value(
                    data.object,
                )?))
            }
            "customer.subscription.deleted" => {
                Ok(BillingEvent::SubscriptionDeleted(serde_json::from_value(
                    data.object,
                )?))
            }
            "payment_method.attached" => Ok(BillingEvent::PaymentMethodAttached(
                serde_json::from_value(data.object)?,
            )),
            "payment_method.detached" => Ok(BillingEvent::PaymentMethodDetached(
                serde_json::from_value(data.object)?,
            )),
            _ => Ok(BillingEvent::Unrecognized { event_type }),
        }
    }
}
