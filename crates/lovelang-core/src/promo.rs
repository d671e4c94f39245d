//! Creator promo redemption.
//!
//! Promo codes grant temporary Standard access by moving
//! `promo_expires_at` into the future. Looking the code up in the hosted
//! code table happens upstream; this module receives an already validated
//! [`PromoGrant`] and decides whether the profile may redeem it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AccessRefusal;
use crate::profile::{ProfileSnapshot, SubscriptionPlan};

/// A validated promo code and how many days of access it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoGrant {
    pub code: String,
    pub grant_days: u32,
}

impl PromoGrant {
    pub fn new(code: impl Into<String>, grant_days: u32) -> Self {
        Self {
            code: code.into().trim().to_string(),
            grant_days,
        }
    }
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRedemption {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub days_granted: u32,
}

impl PromoRedemption {
    pub fn apply(&self, profile: &mut ProfileSnapshot) {
        profile.promo_expires_at = Some(self.expires_at);
        info!(
            profile = %profile.id,
            code = %self.code,
            expires_at = %self.expires_at,
            "promo redeemed"
        );
    }
}

/// Decide whether `profile` may redeem `grant` at `now`.
///
/// # Errors
/// - [`AccessRefusal::AlreadySubscribed`] when a non-free plan is active
/// - [`AccessRefusal::AlreadyHasPromo`] while an earlier promo is running
/// - [`AccessRefusal::InvalidGrant`] when the code is blank or the grant
///   covers zero days or runs past the representable date range
pub fn redeem_promo(
    profile: &ProfileSnapshot,
    grant: &PromoGrant,
    now: DateTime<Utc>,
) -> Result<PromoRedemption, AccessRefusal> {
    let has_paid_subscription = profile.subscription_status.is_active()
        && profile
            .subscription_plan
            .is_some_and(|plan| plan != SubscriptionPlan::Free);
    if has_paid_subscription {
        return Err(AccessRefusal::AlreadySubscribed);
    }
    if profile.promo_expires_at.is_some_and(|t| t > now) {
        return Err(AccessRefusal::AlreadyHasPromo);
    }
    if grant.grant_days == 0 || grant.code.is_empty() {
        return Err(AccessRefusal::InvalidGrant);
    }
    let expires_at = Duration::try_days(i64::from(grant.grant_days))
        .and_then(|length| now.checked_add_signed(length))
        .ok_or(AccessRefusal::InvalidGrant)?;

    Ok(PromoRedemption {
        code: grant.code.clone(),
        expires_at,
        days_granted: grant.grant_days,
    })
}
