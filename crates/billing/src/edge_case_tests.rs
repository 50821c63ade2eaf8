// Test file - these are expected patterns in test code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Edge case tests for billing reconciliation inputs
//!
//! The webhook reconciler's DB writes are exercised against a live store in
//! deployment; what lives here is everything decided before a write happens:
//! envelope decoding oddities, metadata extraction, and the status mapping.

mod envelope_tests {
    use crate::events::{BillingEvent, EventEnvelope};
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<BillingEvent, serde_json::Error> {
        let envelope: EventEnvelope = serde_json::from_value(value)?;
        BillingEvent::from_envelope(envelope)
    }

    #[test]
    fn envelope_without_data_is_a_parse_error() {
        let result: Result<EventEnvelope, _> =
            serde_json::from_value(json!({ "type": "customer.subscription.updated" }));
        assert!(result.is_err());
    }

    #[test]
    fn extra_object_fields_are_ignored() {
        // Real processor payloads carry dozens of fields we never model
        let event = decode(json!({
            "type": "customer.subscription.updated",
            "data": { "object": {
                "id": "sub_1",
                "object": "subscription",
                "application": null,
                "billing_cycle_anchor": 1_700_000_000,
                "collection_method": "charge_automatically",
                "status": "active",
                "metadata": {},
            }},
        }))
        .unwrap();
        assert!(matches!(event, BillingEvent::SubscriptionUpdated(_)));
    }

    #[test]
    fn subscription_object_missing_id_is_an_error() {
        let result = decode(json!({
            "type": "customer.subscription.deleted",
            "data": { "object": { "status": "canceled" } },
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unrecognized_kind_never_fails_even_with_garbage_object() {
        let event = decode(json!({
            "type": "charge.dispute.created",
            "data": { "object": 42 },
        }))
        .unwrap();
        assert!(matches!(event, BillingEvent::Unrecognized { .. }));
    }

    #[test]
    fn period_bounds_accept_missing_values() {
        let event = decode(json!({
            "type": "customer.subscription.created",
            "data": { "object": { "id": "sub_2", "status": "active" } },
        }))
        .unwrap();
        match event {
            BillingEvent::SubscriptionCreated(sub) => {
                assert!(sub.current_period_start.is_none());
                assert!(sub.current_period_end.is_none());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }
}

mod allowance_tests {
    use crate::entitlement::{remaining_from_count, submission_limit, UNLIMITED_SUBMISSIONS};
    use reelforge_shared::SubscriptionTier;

    #[test]
    fn starter_exhausts_after_five() {
        let limit = submission_limit(SubscriptionTier::Starter);
        for used in 0..5 {
            assert!(remaining_from_count(limit, used) > 0, "used={used}");
        }
        assert_eq!(remaining_from_count(limit, 5), 0);
    }

    #[test]
    fn pro_is_never_exhausted() {
        let limit = submission_limit(SubscriptionTier::Pro);
        assert_eq!(remaining_from_count(limit, 0), UNLIMITED_SUBMISSIONS);
        assert_eq!(remaining_from_count(limit, i64::MAX), UNLIMITED_SUBMISSIONS);
    }
}
