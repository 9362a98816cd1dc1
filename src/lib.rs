//! Wilbe - membership platform backend for the scientist-founder community
//!
//! Wilbe serves the web app's authenticated surface: member accounts and
//! roles, the Sprint onboarding questionnaire and per-member task
//! generation, the pre-signup waitlist referral funnel, a lightweight
//! discussion forum, the merch-order flow, and proxies to the email,
//! Slack, and document-storage providers.
//!
//! ## Services
//!
//! - **Auth**: JWT sessions over argon2 credentials, member/admin roles
//! - **Sprint**: questionnaire navigation, profile capture, task generation
//! - **Waitlist**: referral-code signup funnel with referral counting
//! - **Notify**: transactional email + Slack webhook collaborators
//! - **Storage**: document-store upload proxy for task deliverables

pub mod auth;
pub mod config;
pub mod db;
pub mod notify;
pub mod routes;
pub mod server;
pub mod sprint;
pub mod storage;
pub mod types;
pub mod waitlist;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, WilbeError};
