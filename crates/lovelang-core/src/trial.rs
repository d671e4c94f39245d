//! Free trial: status reporting and activation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AccessRefusal;
use crate::profile::ProfileSnapshot;
use crate::reminder::{days_remaining, hours_remaining, REMINDER_BOUNDARY_DAYS};

/// Trial length granted when a user picks the free tier.
pub const DEFAULT_TRIAL_LENGTH_DAYS: u32 = 7;

/// Full trial picture for account screens and support tooling.
///
/// `has_access` does not consult the beta allow-list, and `show_reminder`
/// is the raw boundary check: on the expiry day it stays true after the
/// expiry instant. The overlay decision belongs to
/// [`compute_reminder`](crate::reminder::compute_reminder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialStatus {
    pub has_active_subscription: bool,
    pub has_inherited_access: bool,
    pub has_active_promo: bool,
    pub is_grandfathered: bool,
    pub trial_expired: bool,
    pub trial_expires_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub hours_remaining: Option<i64>,
    pub show_reminder: bool,
    pub has_access: bool,
}

pub fn trial_status(profile: &ProfileSnapshot, now: DateTime<Utc>) -> TrialStatus {
    let expires_at = profile.trial_expires_at;
    let free_tier_chosen = profile.free_tier_chosen_at.is_some();

    let has_active_subscription = profile.subscription_status.is_active();
    let has_inherited_access = profile.subscription_granted_by.is_some();
    let has_active_promo = profile.promo_expires_at.is_some_and(|t| t > now);
    let is_grandfathered = free_tier_chosen && expires_at.is_none();
    let trial_expired = expires_at.is_some_and(|t| t <= now);

    let days = expires_at.map(|t| days_remaining(t, now));
    let hours = match (days, expires_at) {
        (Some(0), Some(t)) => Some(hours_remaining(t, now)),
        _ => None,
    };
    let show_reminder = days.is_some_and(|d| REMINDER_BOUNDARY_DAYS.iter().any(|&b| i64::from(b) == d));

    let has_access = has_active_subscription
        || has_inherited_access
        || has_active_promo
        || is_grandfathered
        || (free_tier_chosen && !trial_expired);

    TrialStatus {
        has_active_subscription,
        has_inherited_access,
        has_active_promo,
        is_grandfathered,
        trial_expired,
        trial_expires_at: expires_at,
        days_remaining: days,
        hours_remaining: hours,
        show_reminder,
        has_access,
    }
}

/// Timestamps to write when the free tier is activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeTierGrant {
    pub free_tier_chosen_at: DateTime<Utc>,
    pub trial_expires_at: DateTime<Utc>,
}

impl FreeTierGrant {
    pub fn apply(&self, profile: &mut ProfileSnapshot) {
        profile.free_tier_chosen_at = Some(self.free_tier_chosen_at);
        profile.trial_expires_at = Some(self.trial_expires_at);
        info!(
            profile = %profile.id,
            expires_at = %self.trial_expires_at,
            "free trial activated"
        );
    }
}

/// Decide whether `profile` may start a free trial.
///
/// The free tier can be chosen once, and only by users with no other
/// access path.
///
/// # Errors
/// Returns the [`AccessRefusal`] explaining why activation is not allowed.
pub fn choose_free_tier(
    profile: &ProfileSnapshot,
    now: DateTime<Utc>,
    trial_length: Duration,
) -> Result<FreeTierGrant, AccessRefusal> {
    if profile.subscription_status.is_active() {
        return Err(AccessRefusal::AlreadySubscribed);
    }
    if profile.subscription_granted_by.is_some() {
        return Err(AccessRefusal::HasPartnerAccess);
    }
    if profile.promo_expires_at.is_some_and(|t| t > now) {
        return Err(AccessRefusal::HasPromoAccess);
    }
    if profile.free_tier_chosen_at.is_some() {
        return Err(AccessRefusal::AlreadyFreeTier);
    }
    let trial_expires_at = now
        .checked_add_signed(trial_length)
        .ok_or(AccessRefusal::InvalidTrialLength)?;

    Ok(FreeTierGrant {
        free_tier_chosen_at: now,
        trial_expires_at,
    })
}
