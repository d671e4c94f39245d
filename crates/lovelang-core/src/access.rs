//! Access gating: which top-level screen a signed-in user sees.
//!
//! The decision is a pure function of a [`ProfileSnapshot`], the clock and
//! the beta-tester allow-list the evaluator was built with. Exactly one
//! [`AppState`] comes out:
//!
//! 1. Onboarding not completed: [`AppState::NeedsOnboarding`], whatever
//!    else the profile holds.
//! 2. Trial expired with no subscription, partner, promo or beta grant:
//!    [`AppState::PaywallRequired`] with `trial_expired = true`.
//! 3. No access path at all: [`AppState::PaywallRequired`] with
//!    `trial_expired = false`.
//! 4. Otherwise [`AppState::MainApp`], carrying a trial reminder on
//!    boundary days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::profile::{ProfileSnapshot, Role};
use crate::reminder::{compute_reminder, ReminderInfo};

/// Statically configured emails that get access regardless of billing.
///
/// Emails are stored trimmed and lowercased; lookups are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BetaAllowList {
    emails: HashSet<String>,
}

impl BetaAllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        emails.into_iter().collect()
    }

    pub fn contains(&self, email: &str) -> bool {
        let email = normalize_email(email);
        !email.is_empty() && self.emails.contains(&email)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for BetaAllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let emails = iter
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Screen selected for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AppState {
    /// Onboarding flow for the given role.
    NeedsOnboarding { role: Option<Role> },
    /// Paywall; `trial_expired` selects the "your trial ended" variant.
    PaywallRequired { trial_expired: bool },
    /// Main application shell, optionally with a trial reminder banner.
    MainApp { trial_reminder: Option<ReminderInfo> },
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            AppState::NeedsOnboarding { .. } => "needs_onboarding",
            AppState::PaywallRequired { .. } => "paywall_required",
            AppState::MainApp { .. } => "main_app",
        }
    }

    pub fn is_main_app(&self) -> bool {
        matches!(self, AppState::MainApp { .. })
    }

    pub fn is_paywall(&self) -> bool {
        matches!(self, AppState::PaywallRequired { .. })
    }
}

/// Every access predicate for one profile at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessFlags {
    pub has_active_subscription: bool,
    pub has_inherited_access: bool,
    pub has_active_promo: bool,
    /// Free tier chosen before trial expiry was tracked. Never expires.
    pub is_grandfathered: bool,
    pub has_active_trial: bool,
    pub is_beta_tester: bool,
    /// Expiry reached, regardless of other grants.
    pub trial_expired: bool,
}

impl AccessFlags {
    pub fn compute(
        profile: &ProfileSnapshot,
        allow_list: &BetaAllowList,
        now: DateTime<Utc>,
    ) -> Self {
        let trial_expires_at = profile.trial_expires_at;
        let free_tier_chosen = profile.free_tier_chosen_at.is_some();

        Self {
            has_active_subscription: profile.subscription_status.is_active(),
            has_inherited_access: profile.subscription_granted_by.is_some(),
            has_active_promo: profile.promo_expires_at.is_some_and(|t| t > now),
            is_grandfathered: free_tier_chosen && trial_expires_at.is_none(),
            has_active_trial: free_tier_chosen && trial_expires_at.is_some_and(|t| t > now),
            is_beta_tester: allow_list.contains(&profile.email),
            trial_expired: trial_expires_at.is_some_and(|t| t <= now),
        }
    }

    pub fn has_access(&self) -> bool {
        self.has_active_subscription
            || self.has_inherited_access
            || self.has_active_promo
            || self.is_grandfathered
            || self.has_active_trial
            || self.is_beta_tester
    }

    /// Whether the "trial expired" paywall applies.
    ///
    /// The grandfathered and active-trial flags are not in this list; both
    /// are false whenever `trial_expired` holds. Keep the
    /// list explicit rather than rewriting it as `trial_expired && !has_access()`.
    pub fn expired_trial_paywall(&self) -> bool {
        self.trial_expired
            && !self.has_active_subscription
            && !self.has_inherited_access
            && !self.has_active_promo
            && !self.is_beta_tester
    }
}

/// Pure access decision engine.
#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    allow_list: BetaAllowList,
}

impl AccessEvaluator {
    pub fn new(allow_list: BetaAllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &BetaAllowList {
        &self.allow_list
    }

    pub fn flags(&self, profile: &ProfileSnapshot, now: DateTime<Utc>) -> AccessFlags {
        AccessFlags::compute(profile, &self.allow_list, now)
    }

    /// Select the screen for `profile` at `now`.
    pub fn evaluate(&self, profile: &ProfileSnapshot, now: DateTime<Utc>) -> AppState {
        if profile.onboarding_completed_at.is_none() {
            debug!(profile = %profile.id, "onboarding pending");
            return AppState::NeedsOnboarding { role: profile.role };
        }

        let flags = self.flags(profile, now);
        let state = if flags.expired_trial_paywall() {
            AppState::PaywallRequired {
                trial_expired: true,
            }
        } else if !flags.has_access() {
            AppState::PaywallRequired {
                trial_expired: false,
            }
        } else {
            AppState::MainApp {
                trial_reminder: compute_reminder(profile.trial_expires_at, now),
            }
        };

        debug!(
            profile = %profile.id,
            state = state.name(),
            subscription = flags.has_active_subscription,
            inherited = flags.has_inherited_access,
            promo = flags.has_active_promo,
            grandfathered = flags.is_grandfathered,
            trial = flags.has_active_trial,
            beta = flags.is_beta_tester,
            trial_expired = flags.trial_expired,
            "access evaluated"
        );
        state
    }
}
