//! Domain vocabulary shared across crates

use serde::{Deserialize, Serialize};

/// Error returned when parsing a domain string fails
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseDomainError {
    kind: &'static str,
    value: String,
}

/// Subscription tier determining quota and feature access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Starter,
    Creator,
    Pro,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Creator => "creator",
            SubscriptionTier::Pro => "pro",
        }
    }

    /// Tiers purchasable through checkout (starter is the implicit free tier)
    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Starter)
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionTier {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "starter" => Ok(SubscriptionTier::Starter),
            "creator" => Ok(SubscriptionTier::Creator),
            "pro" => Ok(SubscriptionTier::Pro),
            other => Err(ParseDomainError {
                kind: "tier",
                value: other.to_string(),
            }),
        }
    }
}

/// Lifecycle state of one generation request.
///
/// Transitions are forward-only: pending -> processing -> {completed | failed}.
/// Terminal states accept no further transition; re-delivery of the same
/// terminal update is handled as a no-op by the store, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Processing => "processing",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Failed => "failed",
        }
    }

    /// Completed and failed are absorbing states
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed)
    }

    /// Whether a write moving this status to `next` is legal.
    ///
    /// Same-state writes to a non-terminal status are allowed so a redelivered
    /// callback can still merge result fields.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        match self {
            SubmissionStatus::Pending => true,
            SubmissionStatus::Processing => !matches!(next, SubmissionStatus::Pending),
            SubmissionStatus::Completed | SubmissionStatus::Failed => false,
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "processing" => Ok(SubmissionStatus::Processing),
            "completed" => Ok(SubmissionStatus::Completed),
            "failed" => Ok(SubmissionStatus::Failed),
            other => Err(ParseDomainError {
                kind: "submission status",
                value: other.to_string(),
            }),
        }
    }
}

/// Template style offered by the generation form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateStyle {
    #[default]
    #[serde(rename = "Product Ad")]
    ProductAd,
    #[serde(rename = "Social Media Reel")]
    SocialMediaReel,
    #[serde(rename = "Lifestyle")]
    Lifestyle,
    #[serde(rename = "Corporate")]
    Corporate,
}

impl TemplateStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStyle::ProductAd => "Product Ad",
            TemplateStyle::SocialMediaReel => "Social Media Reel",
            TemplateStyle::Lifestyle => "Lifestyle",
            TemplateStyle::Corporate => "Corporate",
        }
    }
}

impl std::fmt::Display for TemplateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TemplateStyle {
    type Err = ParseDomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Product Ad" => Ok(TemplateStyle::ProductAd),
            "Social Media Reel" => Ok(TemplateStyle::SocialMediaReel),
            "Lifestyle" => Ok(TemplateStyle::Lifestyle),
            "Corporate" => Ok(TemplateStyle::Corporate),
            other => Err(ParseDomainError {
                kind: "template style",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_move_anywhere_forward() {
        let s = SubmissionStatus::Pending;
        assert!(s.can_transition_to(SubmissionStatus::Processing));
        assert!(s.can_transition_to(SubmissionStatus::Completed));
        assert!(s.can_transition_to(SubmissionStatus::Failed));
    }

    #[test]
    fn processing_cannot_move_backward() {
        let s = SubmissionStatus::Processing;
        assert!(!s.can_transition_to(SubmissionStatus::Pending));
        assert!(s.can_transition_to(SubmissionStatus::Processing));
        assert!(s.can_transition_to(SubmissionStatus::Completed));
        assert!(s.can_transition_to(SubmissionStatus::Failed));
    }

    #[test]
    fn terminal_states_accept_no_transition() {
        for s in [SubmissionStatus::Completed, SubmissionStatus::Failed] {
            assert!(s.is_terminal());
            assert!(!s.can_transition_to(SubmissionStatus::Pending));
            assert!(!s.can_transition_to(SubmissionStatus::Processing));
            assert!(!s.can_transition_to(SubmissionStatus::Completed));
            assert!(!s.can_transition_to(SubmissionStatus::Failed));
        }
    }

    #[test]
    fn tier_round_trips_through_strings() {
        for tier in [
            SubscriptionTier::Starter,
            SubscriptionTier::Creator,
            SubscriptionTier::Pro,
        ] {
            assert_eq!(tier.as_str().parse::<SubscriptionTier>().unwrap(), tier);
        }
        assert!("platinum".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn template_style_round_trips_through_strings() {
        for style in [
            TemplateStyle::ProductAd,
            TemplateStyle::SocialMediaReel,
            TemplateStyle::Lifestyle,
            TemplateStyle::Corporate,
        ] {
            assert_eq!(style.as_str().parse::<TemplateStyle>().unwrap(), style);
        }
        assert!("Vaporwave".parse::<TemplateStyle>().is_err());
    }

    #[test]
    fn status_serde_uses_lowercase() {
        let json = serde_json::to_string(&SubmissionStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
        let parsed: SubmissionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, SubmissionStatus::Failed);
    }
}
