//! Effective subscription plan, used for feature limits and API gating.
//!
//! Priority order:
//! 1. Active paid subscription
//! 2. Partner-inherited access (Standard)
//! 3. Active creator promo (Standard)
//! 4. Free tier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::profile::{ProfileSnapshot, SubscriptionPlan};

const TRIAL_EXPIRED_REASON: &str = "Your free trial has expired. Please subscribe to continue.";
const SUBSCRIPTION_REQUIRED_REASON: &str =
    "Subscription required. Please subscribe to access this feature.";

/// Plan used to pick usage limits. Never fails; anyone without a paid or
/// granted plan is on `Free`.
pub fn resolve_plan(profile: &ProfileSnapshot, now: DateTime<Utc>) -> SubscriptionPlan {
    if profile.subscription_status.is_active() {
        let plan = profile.subscription_plan.unwrap_or(SubscriptionPlan::Standard);
        if plan.is_paid() {
            return plan;
        }
    }
    if profile.subscription_granted_by.is_some() {
        return SubscriptionPlan::Standard;
    }
    if profile.promo_expires_at.is_some_and(|t| t > now) {
        return SubscriptionPlan::Standard;
    }
    SubscriptionPlan::Free
}

/// Outcome of a feature-access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCheck {
    pub allowed: bool,
    pub plan: SubscriptionPlan,
    /// User-facing explanation when not allowed.
    pub reason: Option<String>,
}

impl SubscriptionCheck {
    fn allow(plan: SubscriptionPlan) -> Self {
        Self {
            allowed: true,
            plan,
            reason: None,
        }
    }

    fn deny(reason: &str) -> Self {
        Self {
            allowed: false,
            plan: SubscriptionPlan::None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Gate a feature on having any access path.
///
/// An active subscription reports its stored plan (Standard when unset).
pub fn require_subscription(profile: &ProfileSnapshot, now: DateTime<Utc>) -> SubscriptionCheck {
    if profile.subscription_status.is_active() {
        return SubscriptionCheck::allow(
            profile.subscription_plan.unwrap_or(SubscriptionPlan::Standard),
        );
    }
    if profile.subscription_granted_by.is_some() {
        return SubscriptionCheck::allow(SubscriptionPlan::Standard);
    }
    if profile.promo_expires_at.is_some_and(|t| t > now) {
        return SubscriptionCheck::allow(SubscriptionPlan::Standard);
    }
    if profile.free_tier_chosen_at.is_some() {
        if profile.trial_expires_at.is_some_and(|t| t <= now) {
            return SubscriptionCheck::deny(TRIAL_EXPIRED_REASON);
        }
        return SubscriptionCheck::allow(SubscriptionPlan::Free);
    }
    SubscriptionCheck::deny(SUBSCRIPTION_REQUIRED_REASON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot::new(Uuid::nil(), "a@b.c")
    }

    #[test]
    fn active_unlimited_keeps_plan() {
        let mut p = profile();
        p.activate_subscription(SubscriptionPlan::Unlimited);
        assert_eq!(resolve_plan(&p, now()), SubscriptionPlan::Unlimited);
        assert_eq!(
            require_subscription(&p, now()),
            SubscriptionCheck::allow(SubscriptionPlan::Unlimited)
        );
    }

    #[test]
    fn active_without_plan_defaults_to_standard() {
        let mut p = profile();
        p.subscription_status = crate::profile::SubscriptionStatus::Active;
        assert_eq!(resolve_plan(&p, now()), SubscriptionPlan::Standard);
    }

    #[test]
    fn active_free_plan_falls_through_to_free() {
        let mut p = profile();
        p.activate_subscription(SubscriptionPlan::Free);
        assert_eq!(resolve_plan(&p, now()), SubscriptionPlan::Free);
    }

    #[test]
    fn partner_and_promo_are_standard() {
        let mut p = profile();
        p.grant_partner_access("partner");
        assert_eq!(resolve_plan(&p, now()), SubscriptionPlan::Standard);

        let mut q = profile();
        q.promo_expires_at = Some(now() + Duration::days(30));
        assert_eq!(resolve_plan(&q, now()), SubscriptionPlan::Standard);

        q.promo_expires_at = Some(now());
        assert_eq!(resolve_plan(&q, now()), SubscriptionPlan::Free);
    }

    #[test]
    fn expired_trial_is_denied_with_reason() {
        let mut p = profile();
        p.free_tier_chosen_at = Some(now() - Duration::days(8));
        p.trial_expires_at = Some(now() - Duration::days(1));

        let check = require_subscription(&p, now());
        assert!(!check.allowed);
        assert_eq!(check.plan, SubscriptionPlan::None);
        assert_eq!(check.reason.as_deref(), Some(TRIAL_EXPIRED_REASON));
    }

    #[test]
    fn grandfathered_is_allowed_free() {
        let mut p = profile();
        p.free_tier_chosen_at = Some(now() - Duration::days(400));
        assert_eq!(
            require_subscription(&p, now()),
            SubscriptionCheck::allow(SubscriptionPlan::Free)
        );
    }

    #[test]
    fn nothing_is_denied() {
        let check = require_subscription(&profile(), now());
        assert!(!check.allowed);
        assert_eq!(check.reason.as_deref(), Some(SUBSCRIPTION_REQUIRED_REASON));
    }
}
