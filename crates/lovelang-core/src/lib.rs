//! # Love Languages Core Library
//!
//! This library decides what a signed-in Love Languages user gets to see:
//! onboarding, a paywall, or the main app with an optional trial reminder.
//! All decisions are pure functions of a profile snapshot and the clock,
//! with the standalone CLI and any UI layer being thin front ends over the
//! same library.
//!
//! ## Architecture
//!
//! - **Access**: the evaluator mapping a profile and an instant to an [`AppState`]
//! - **Reminders**: boundary-day trial reminders and per-boundary dismissals
//! - **Trial / Plan / Promo**: lifecycle decisions around free trials,
//!   effective plans and creator promo codes
//! - **Storage**: SQLite-backed profile and client state, TOML configuration
//!
//! ## Key Components
//!
//! - [`AccessEvaluator`]: access decision engine
//! - [`ReminderGate`]: reminder display filter over a [`DismissalStore`]
//! - [`Database`]: local profile and key-value persistence
//! - [`Config`]: beta allow-list, trial length and reminder settings

pub mod access;
pub mod error;
pub mod plan;
pub mod profile;
pub mod promo;
pub mod reminder;
pub mod storage;
pub mod trial;

pub use access::{AccessEvaluator, AccessFlags, AppState, BetaAllowList};
pub use error::{AccessRefusal, ConfigError, CoreError, DatabaseError, ProfileError};
pub use plan::{require_subscription, resolve_plan, SubscriptionCheck};
pub use profile::{
    ProfileId, ProfileRow, ProfileSnapshot, Role, SubscriptionPlan, SubscriptionStatus,
};
pub use promo::{redeem_promo, PromoGrant, PromoRedemption};
pub use reminder::{
    compute_reminder, DismissalStore, MemoryDismissalStore, ReminderGate, ReminderInfo,
    ReminderUrgency,
};
pub use storage::{Config, Database, ProfileStore};
pub use trial::{choose_free_tier, trial_status, FreeTierGrant, TrialStatus};
