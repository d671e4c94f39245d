//! Trial reminder scheduling.
//!
//! A reminder is eligible on four boundary days before trial expiry:
//!
//! - **Day 5**: gentle heads-up
//! - **Day 3**: reminder
//! - **Day 1**: warning
//! - **Day 0**: last day, with an hours countdown
//!
//! [`compute_reminder`] is a pure function of the expiry and the clock.
//! Whether an eligible reminder is actually shown is decided by
//! [`ReminderGate`], which remembers per-boundary dismissals through an
//! injected [`DismissalStore`]. Dismissing day 3 does not hide day 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::debug;

/// Days-remaining values on which a reminder may be shown.
pub const REMINDER_BOUNDARY_DAYS: [u32; 4] = [5, 3, 1, 0];

/// Prefix of the per-boundary dismissal key.
pub const DISMISSAL_KEY_PREFIX: &str = "trial_reminder_dismissed_";

const MS_PER_HOUR: i64 = 60 * 60 * 1000;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// An eligible trial reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderInfo {
    /// Whole days left, one of [`REMINDER_BOUNDARY_DAYS`].
    pub days_remaining: u32,
    /// Only set on the last day.
    pub hours_remaining: Option<u32>,
}

/// Severity bucket of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderUrgency {
    FiveDays,
    ThreeDays,
    OneDay,
    LastDay,
}

/// Default copy for a reminder banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub title: String,
    pub subtitle: String,
}

impl ReminderInfo {
    pub fn urgency(&self) -> ReminderUrgency {
        match self.days_remaining {
            0 => ReminderUrgency::LastDay,
            1 => ReminderUrgency::OneDay,
            3 => ReminderUrgency::ThreeDays,
            _ => ReminderUrgency::FiveDays,
        }
    }

    pub fn message(&self) -> ReminderMessage {
        let (title, subtitle) = match self.urgency() {
            ReminderUrgency::LastDay => {
                let subtitle = match self.hours_remaining {
                    Some(hours) if hours > 0 => format!("Only {hours} hours left"),
                    _ => "Subscribe now to keep learning together".to_string(),
                };
                ("Last day of your trial!".to_string(), subtitle)
            }
            ReminderUrgency::OneDay => (
                "1 day left in your trial".to_string(),
                "Don't lose your progress!".to_string(),
            ),
            ReminderUrgency::ThreeDays => (
                "3 days left in your trial".to_string(),
                "Subscribe to continue learning together".to_string(),
            ),
            ReminderUrgency::FiveDays => (
                "5 days left in your trial".to_string(),
                "Enjoying learning together? Keep it going!".to_string(),
            ),
        };
        ReminderMessage { title, subtitle }
    }

    /// Key under which this boundary's dismissal is stored.
    pub fn dismissal_key(&self) -> String {
        dismissal_key(self.days_remaining)
    }
}

pub fn dismissal_key(days_remaining: u32) -> String {
    format!("{DISMISSAL_KEY_PREFIX}{days_remaining}")
}

/// Whole days until `expires_at`, floored and clamped at zero.
pub fn days_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (expires_at - now).num_milliseconds();
    ms.div_euclid(MS_PER_DAY).max(0)
}

/// Hours until `expires_at`, rounded up and clamped at zero.
pub fn hours_remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let ms = (expires_at - now).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    (ms + MS_PER_HOUR - 1) / MS_PER_HOUR
}

fn is_boundary(days: i64) -> bool {
    REMINDER_BOUNDARY_DAYS.iter().any(|&d| i64::from(d) == days)
}

/// Decide whether a trial reminder is eligible right now.
///
/// Returns `None` when there is no trial, when the trial has already
/// expired, or when the day bucket is not a boundary day.
pub fn compute_reminder(
    trial_expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<ReminderInfo> {
    let expires_at = trial_expires_at?;
    if expires_at <= now {
        return None;
    }

    let days = days_remaining(expires_at, now);
    if !is_boundary(days) {
        debug!(days, "no reminder: not a boundary day");
        return None;
    }

    let hours_remaining = if days == 0 {
        u32::try_from(hours_remaining(expires_at, now)).ok()
    } else {
        None
    };

    let info = ReminderInfo {
        days_remaining: days as u32,
        hours_remaining,
    };
    debug!(days = info.days_remaining, hours = ?info.hours_remaining, "trial reminder eligible");
    Some(info)
}

/// Per-client persistence of dismissed reminder boundaries.
pub trait DismissalStore {
    type Error: std::error::Error;

    fn is_dismissed(&self, key: &str) -> Result<bool, Self::Error>;

    fn set_dismissed(&mut self, key: &str, dismissed: bool) -> Result<(), Self::Error>;
}

/// In-memory dismissal store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDismissalStore {
    flags: HashMap<String, bool>,
}

impl MemoryDismissalStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DismissalStore for MemoryDismissalStore {
    type Error = Infallible;

    fn is_dismissed(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.flags.get(key).copied().unwrap_or(false))
    }

    fn set_dismissed(&mut self, key: &str, dismissed: bool) -> Result<(), Self::Error> {
        self.flags.insert(key.to_string(), dismissed);
        Ok(())
    }
}

impl<S: DismissalStore + ?Sized> DismissalStore for &mut S {
    type Error = S::Error;

    fn is_dismissed(&self, key: &str) -> Result<bool, Self::Error> {
        (**self).is_dismissed(key)
    }

    fn set_dismissed(&mut self, key: &str, dismissed: bool) -> Result<(), Self::Error> {
        (**self).set_dismissed(key, dismissed)
    }
}

/// Filters eligible reminders against remembered dismissals.
#[derive(Debug)]
pub struct ReminderGate<S> {
    store: S,
    enabled: bool,
}

impl<S: DismissalStore> ReminderGate<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            enabled: true,
        }
    }

    /// Disable to suppress every reminder regardless of dismissals.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The reminder to display, if any.
    pub fn visible(&self, reminder: Option<ReminderInfo>) -> Result<Option<ReminderInfo>, S::Error> {
        let Some(info) = reminder else {
            return Ok(None);
        };
        if !self.enabled || !is_boundary(i64::from(info.days_remaining)) {
            return Ok(None);
        }
        if self.store.is_dismissed(&info.dismissal_key())? {
            debug!(days = info.days_remaining, "reminder already dismissed");
            return Ok(None);
        }
        Ok(Some(info))
    }

    /// Remember that this boundary was dismissed.
    pub fn dismiss(&mut self, reminder: &ReminderInfo) -> Result<(), S::Error> {
        self.dismiss_day(reminder.days_remaining)
    }

    pub fn dismiss_day(&mut self, days_remaining: u32) -> Result<(), S::Error> {
        self.store.set_dismissed(&dismissal_key(days_remaining), true)
    }

    /// Forget every boundary dismissal.
    pub fn reset(&mut self) -> Result<(), S::Error> {
        for day in REMINDER_BOUNDARY_DAYS {
            self.store.set_dismissed(&dismissal_key(day), false)?;
        }
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn no_trial_no_reminder() {
        assert_eq!(compute_reminder(None, now()), None);
    }

    #[test]
    fn four_days_twenty_three_hours_is_not_a_boundary() {
        let expires = now() + Duration::days(4) + Duration::hours(23);
        assert_eq!(days_remaining(expires, now()), 4);
        assert_eq!(compute_reminder(Some(expires), now()), None);
    }

    #[test]
    fn last_day_carries_hours() {
        let expires = now() + Duration::hours(2);
        assert_eq!(
            compute_reminder(Some(expires), now()),
            Some(ReminderInfo {
                days_remaining: 0,
                hours_remaining: Some(2),
            })
        );
    }

    #[test]
    fn partial_hour_rounds_up() {
        let expires = now() + Duration::minutes(61);
        let info = compute_reminder(Some(expires), now()).unwrap();
        assert_eq!(info.hours_remaining, Some(2));
    }

    #[test]
    fn boundary_days_have_no_hours() {
        for day in [5i64, 3, 1] {
            let expires = now() + Duration::days(day) + Duration::minutes(30);
            let info = compute_reminder(Some(expires), now()).unwrap();
            assert_eq!(i64::from(info.days_remaining), day);
            assert_eq!(info.hours_remaining, None);
        }
    }

    #[test]
    fn expired_trial_has_no_reminder() {
        assert_eq!(compute_reminder(Some(now()), now()), None);
        assert_eq!(
            compute_reminder(Some(now() - Duration::milliseconds(1)), now()),
            None
        );
    }

    #[test]
    fn urgency_and_message() {
        let last = ReminderInfo {
            days_remaining: 0,
            hours_remaining: Some(3),
        };
        assert_eq!(last.urgency(), ReminderUrgency::LastDay);
        assert_eq!(last.message().subtitle, "Only 3 hours left");

        let last_no_hours = ReminderInfo {
            days_remaining: 0,
            hours_remaining: Some(0),
        };
        assert_eq!(
            last_no_hours.message().subtitle,
            "Subscribe now to keep learning together"
        );

        let five = ReminderInfo {
            days_remaining: 5,
            hours_remaining: None,
        };
        assert_eq!(five.message().title, "5 days left in your trial");
    }

    #[test]
    fn gate_hides_only_dismissed_boundary() {
        let mut gate = ReminderGate::new(MemoryDismissalStore::new());
        let three = ReminderInfo {
            days_remaining: 3,
            hours_remaining: None,
        };
        let one = ReminderInfo {
            days_remaining: 1,
            hours_remaining: None,
        };

        assert_eq!(gate.visible(Some(three)).unwrap(), Some(three));
        gate.dismiss(&three).unwrap();
        assert_eq!(gate.visible(Some(three)).unwrap(), None);
        assert_eq!(gate.visible(Some(one)).unwrap(), Some(one));

        gate.reset().unwrap();
        assert_eq!(gate.visible(Some(three)).unwrap(), Some(three));
    }

    #[test]
    fn disabled_gate_shows_nothing() {
        let gate = ReminderGate::new(MemoryDismissalStore::new()).with_enabled(false);
        let info = ReminderInfo {
            days_remaining: 5,
            hours_remaining: None,
        };
        assert_eq!(gate.visible(Some(info)).unwrap(), None);
    }

    #[test]
    fn gate_over_borrowed_store() {
        let mut store = MemoryDismissalStore::new();
        {
            let mut gate = ReminderGate::new(&mut store);
            gate.dismiss_day(5).unwrap();
        }
        assert!(store.is_dismissed("trial_reminder_dismissed_5").unwrap());
    }

    #[test]
    fn gate_hands_back_its_store() {
        let mut gate = ReminderGate::new(MemoryDismissalStore::new());
        gate.dismiss_day(1).unwrap();
        assert!(gate.store().is_dismissed("trial_reminder_dismissed_1").unwrap());

        let store = gate.into_inner();
        assert!(store.is_dismissed("trial_reminder_dismissed_1").unwrap());
        assert!(!store.is_dismissed("trial_reminder_dismissed_3").unwrap());
    }

    proptest! {
        #[test]
        fn reminder_is_idempotent_and_on_boundaries(offset_ms in -10_000_000_000i64..10_000_000_000i64) {
            let expires = now() + Duration::milliseconds(offset_ms);
            let first = compute_reminder(Some(expires), now());
            let second = compute_reminder(Some(expires), now());
            prop_assert_eq!(first, second);
            if let Some(info) = first {
                prop_assert!(REMINDER_BOUNDARY_DAYS.contains(&info.days_remaining));
                prop_assert!(offset_ms > 0);
                prop_assert_eq!(info.hours_remaining.is_some(), info.days_remaining == 0);
            }
        }
    }
}
