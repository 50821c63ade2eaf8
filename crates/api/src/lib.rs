#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Reelforge API Server
//!
//! The HTTP backend for the Reelforge dashboard: submission lifecycle,
//! entitlement checks, checkout issuance, and the two webhook reconcilers
//! (billing events from Stripe, completion callbacks from the generation
//! engine).

pub mod config;
pub mod error;
pub mod generation;
pub mod poller;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::ApiError;
pub use state::AppState;
