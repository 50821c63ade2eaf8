//! Billing error types

use thiserror::Error;

/// Errors produced by the billing crate
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid tier: {0}")]
    InvalidTier(String),

    #[error("Event metadata missing {0}")]
    MissingMetadata(&'static str),

    #[error("Stripe API error: {0}")]
    StripeApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        BillingError::Database(e.to_string())
    }
}

impl From<stripe::StripeError> for BillingError {
    fn from(e: stripe::StripeError) -> Self {
        BillingError::StripeApi(e.to_string())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
