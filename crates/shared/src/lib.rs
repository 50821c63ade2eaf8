#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Reelforge Shared Module
//!
//! Types and database plumbing used by every crate in the workspace:
//!
//! - **Domain vocabulary**: subscription tiers, the submission status state
//!   machine, template styles
//! - **Database**: pool construction and embedded migrations

pub mod db;
pub mod types;

pub use db::{create_pool, run_migrations};
pub use types::{SubmissionStatus, SubscriptionTier, TemplateStyle};
