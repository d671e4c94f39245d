//! Profile data model.
//!
//! Two shapes live here:
//! - [`ProfileRow`]: the raw row as the hosted backend returns it, with
//!   timestamps as loosely formatted strings and unknown columns ignored
//! - [`ProfileSnapshot`]: the typed, normalized value every decision
//!   function reads
//!
//! Normalization is where malformed data is handled. A timestamp that
//! cannot be parsed becomes `None` (the feature it gates is treated as
//! absent) and a warning is logged. Decision code never sees raw strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ProfileError;

/// Opaque user identifier.
pub type ProfileId = Uuid;

/// Full name given to profiles created without one.
pub const DEFAULT_FULL_NAME: &str = "Lover";

/// Which side of the couple this user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Learning their partner's language
    Student,
    /// Native speaker helping their partner
    Tutor,
}

impl FromStr for Role {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "tutor" => Ok(Role::Tutor),
            _ => Err(ProfileError::InvalidValue {
                field: "role".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Tutor => write!(f, "tutor"),
        }
    }
}

/// Billing status as reported by the payment provider webhooks.
///
/// Only `Active` grants access; every other value is equivalent for
/// gating purposes. Unknown statuses are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Inactive,
    PastDue,
    Canceled,
    Other(String),
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }
}

impl From<String> for SubscriptionStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "active" => SubscriptionStatus::Active,
            "inactive" | "" => SubscriptionStatus::Inactive,
            "past_due" => SubscriptionStatus::PastDue,
            "canceled" => SubscriptionStatus::Canceled,
            _ => SubscriptionStatus::Other(value),
        }
    }
}

impl From<SubscriptionStatus> for String {
    fn from(value: SubscriptionStatus) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionStatus::Active => write!(f, "active"),
            SubscriptionStatus::Inactive => write!(f, "inactive"),
            SubscriptionStatus::PastDue => write!(f, "past_due"),
            SubscriptionStatus::Canceled => write!(f, "canceled"),
            SubscriptionStatus::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Subscription tier. `None` is the stored "no plan" value, distinct from
/// the field being absent altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    #[default]
    None,
    Free,
    Standard,
    Unlimited,
}

impl SubscriptionPlan {
    /// Standard and Unlimited are the paid tiers.
    pub fn is_paid(self) -> bool {
        matches!(self, SubscriptionPlan::Standard | SubscriptionPlan::Unlimited)
    }
}

impl FromStr for SubscriptionPlan {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SubscriptionPlan::None),
            "free" => Ok(SubscriptionPlan::Free),
            "standard" => Ok(SubscriptionPlan::Standard),
            "unlimited" => Ok(SubscriptionPlan::Unlimited),
            _ => Err(ProfileError::InvalidValue {
                field: "subscription_plan".into(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubscriptionPlan::None => "none",
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Standard => "standard",
            SubscriptionPlan::Unlimited => "unlimited",
        };
        write!(f, "{s}")
    }
}

/// Typed profile snapshot. Read-only from the evaluator's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub id: ProfileId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    /// Absent until the bootstrap collaborator or onboarding assigns one.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub onboarding_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub subscription_plan: Option<SubscriptionPlan>,
    /// Id of the partner whose subscription this profile inherits.
    #[serde(default)]
    pub subscription_granted_by: Option<String>,
    #[serde(default)]
    pub promo_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub free_tier_chosen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trial_expires_at: Option<DateTime<Utc>>,
}

impl ProfileSnapshot {
    /// Empty profile: no role, nothing granted, onboarding pending.
    pub fn new(id: ProfileId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: String::new(),
            role: None,
            onboarding_completed_at: None,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_plan: None,
            subscription_granted_by: None,
            promo_expires_at: None,
            free_tier_chosen_at: None,
            trial_expires_at: None,
        }
    }

    /// The row created on first successful authentication.
    pub fn bootstrap(id: ProfileId, email: &str, full_name: Option<&str>) -> Self {
        let full_name = full_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_FULL_NAME);
        Self {
            full_name: full_name.to_string(),
            role: Some(Role::Student),
            ..Self::new(id, email)
        }
    }

    pub fn is_onboarded(&self) -> bool {
        self.onboarding_completed_at.is_some()
    }

    /// Mark onboarding complete. An existing completion timestamp is kept.
    pub fn complete_onboarding(&mut self, role: Role, now: DateTime<Utc>) {
        self.role = Some(role);
        if self.onboarding_completed_at.is_none() {
            self.onboarding_completed_at = Some(now);
            info!(profile = %self.id, %role, "onboarding completed");
        }
    }

    /// Apply a successful checkout webhook.
    pub fn activate_subscription(&mut self, plan: SubscriptionPlan) {
        self.subscription_status = SubscriptionStatus::Active;
        self.subscription_plan = Some(plan);
        info!(profile = %self.id, %plan, "subscription activated");
    }

    /// Apply a cancellation or payment-failure webhook.
    pub fn deactivate_subscription(&mut self, status: SubscriptionStatus) {
        info!(profile = %self.id, %status, "subscription deactivated");
        self.subscription_status = status;
    }

    pub fn grant_partner_access(&mut self, granted_by: impl Into<String>) {
        let granted_by = granted_by.into();
        info!(profile = %self.id, %granted_by, "partner access granted");
        self.subscription_granted_by = Some(granted_by);
    }

    pub fn revoke_partner_access(&mut self) {
        if self.subscription_granted_by.take().is_some() {
            info!(profile = %self.id, "partner access revoked");
        }
    }
}

/// Raw profile row as delivered by the hosted backend.
///
/// Every column is optional and loosely typed; unknown columns are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileRow {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub onboarding_completed_at: Option<String>,
    pub subscription_status: Option<String>,
    pub subscription_plan: Option<String>,
    pub subscription_granted_by: Option<String>,
    pub promo_expires_at: Option<String>,
    pub free_tier_chosen_at: Option<String>,
    pub trial_expires_at: Option<String>,
}

impl ProfileRow {
    /// Convert into a typed snapshot.
    ///
    /// # Errors
    /// Returns [`ProfileError::InvalidId`] if `id` is not a UUID. Every other
    /// malformed field is normalized to absent.
    pub fn normalize(self) -> Result<ProfileSnapshot, ProfileError> {
        let id = Uuid::parse_str(self.id.trim())
            .map_err(|_| ProfileError::InvalidId(self.id.clone()))?;

        let role = self.role.as_deref().and_then(|raw| {
            raw.parse::<Role>()
                .map_err(|_| warn!(profile = %id, raw, "unknown role, treating as absent"))
                .ok()
        });

        let subscription_plan = self.subscription_plan.as_deref().and_then(|raw| {
            raw.parse::<SubscriptionPlan>()
                .map_err(|_| warn!(profile = %id, raw, "unknown plan, treating as absent"))
                .ok()
        });

        Ok(ProfileSnapshot {
            id,
            email: self.email.unwrap_or_default(),
            full_name: self.full_name.unwrap_or_default(),
            role,
            onboarding_completed_at: normalize_timestamp(
                id,
                "onboarding_completed_at",
                self.onboarding_completed_at.as_deref(),
            ),
            subscription_status: self
                .subscription_status
                .map(SubscriptionStatus::from)
                .unwrap_or_default(),
            subscription_plan,
            subscription_granted_by: self
                .subscription_granted_by
                .filter(|g| !g.trim().is_empty()),
            promo_expires_at: normalize_timestamp(
                id,
                "promo_expires_at",
                self.promo_expires_at.as_deref(),
            ),
            free_tier_chosen_at: normalize_timestamp(
                id,
                "free_tier_chosen_at",
                self.free_tier_chosen_at.as_deref(),
            ),
            trial_expires_at: normalize_timestamp(
                id,
                "trial_expires_at",
                self.trial_expires_at.as_deref(),
            ),
        })
    }
}

fn normalize_timestamp(id: ProfileId, field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!(profile = %id, field, raw, "malformed timestamp, treating as absent");
    }
    parsed
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
