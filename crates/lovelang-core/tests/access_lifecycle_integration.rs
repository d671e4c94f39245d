//! Integration tests for the profile access lifecycle.
//!
//! These tests walk a profile from first sign-in through onboarding, the
//! free trial, its reminders and expiry, and back into the app via a
//! subscription, checking the screen selected at every step.

use chrono::{DateTime, Duration, TimeZone, Utc};
use lovelang_core::{
    choose_free_tier, redeem_promo, require_subscription, AccessEvaluator, AppState,
    BetaAllowList, Config, Database, ProfileRow, ProfileStore, PromoGrant, ReminderGate,
    ReminderInfo, Role, SubscriptionPlan,
};
use uuid::Uuid;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
}

fn reminder(days: u32, hours: Option<u32>) -> AppState {
    AppState::MainApp {
        trial_reminder: Some(ReminderInfo {
            days_remaining: days,
            hours_remaining: hours,
        }),
    }
}

#[test]
fn test_trial_lifecycle_end_to_end() {
    let db = Database::open_memory().unwrap();
    let config = Config::default();
    let evaluator = AccessEvaluator::new(config.beta_allow_list());
    let id = Uuid::new_v4();

    // First sign-in creates the row and routes to onboarding.
    let mut profile = db.fetch_or_create(id, "ana@example.com", Some("Ana")).unwrap();
    assert_eq!(
        evaluator.evaluate(&profile, start()),
        AppState::NeedsOnboarding {
            role: Some(Role::Student)
        }
    );

    // Onboarding without any access path lands on the standard paywall.
    profile.complete_onboarding(Role::Student, start());
    db.save(&profile).unwrap();
    assert_eq!(
        evaluator.evaluate(&profile, start()),
        AppState::PaywallRequired {
            trial_expired: false
        }
    );

    // Picking the free tier starts a 7 day trial.
    let grant = choose_free_tier(&profile, start(), config.trial_length()).unwrap();
    grant.apply(&mut profile);
    db.save(&profile).unwrap();
    let profile = db.require(id).unwrap();

    // Day 6 and day 4 remaining: no reminder.
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::hours(1)),
        AppState::MainApp {
            trial_reminder: None
        }
    );
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(2) + Duration::hours(1)),
        AppState::MainApp {
            trial_reminder: None
        }
    );

    // Boundary days.
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(2) - Duration::hours(1)),
        reminder(5, None)
    );
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(1) + Duration::hours(12)),
        reminder(5, None)
    );
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(4)),
        reminder(3, None)
    );
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(6) - Duration::minutes(1)),
        reminder(1, None)
    );
    assert_eq!(
        evaluator.evaluate(&profile, start() + Duration::days(7) - Duration::hours(5)),
        reminder(0, Some(5))
    );

    // Expiry.
    let expired_at = start() + Duration::days(7);
    assert_eq!(
        evaluator.evaluate(&profile, expired_at),
        AppState::PaywallRequired { trial_expired: true }
    );
    assert!(!require_subscription(&profile, expired_at).allowed);

    // Subscribing restores access with no reminder.
    let mut profile = profile;
    profile.activate_subscription(SubscriptionPlan::Standard);
    db.save(&profile).unwrap();
    assert_eq!(
        evaluator.evaluate(&db.require(id).unwrap(), expired_at + Duration::days(30)),
        AppState::MainApp {
            trial_reminder: None
        }
    );
}

#[test]
fn test_reminder_gate_over_database() {
    let db = Database::open_memory().unwrap();
    let evaluator = AccessEvaluator::default();
    let id = Uuid::new_v4();

    let mut profile = db.fetch_or_create(id, "ana@example.com", None).unwrap();
    profile.complete_onboarding(Role::Tutor, start());
    choose_free_tier(&profile, start(), Duration::days(7))
        .unwrap()
        .apply(&mut profile);
    db.save(&profile).unwrap();

    let mut gate = ReminderGate::new(db);
    let three_days_left = start() + Duration::days(4);
    let one_day_left = start() + Duration::days(6) - Duration::minutes(1);

    let shown = match evaluator.evaluate(&profile, three_days_left) {
        AppState::MainApp { trial_reminder } => gate.visible(trial_reminder).unwrap(),
        other => panic!("unexpected state {other:?}"),
    };
    let shown = shown.expect("day 3 reminder should be visible");
    gate.dismiss(&shown).unwrap();

    // Dismissed boundary stays hidden, the next one shows.
    if let AppState::MainApp { trial_reminder } = evaluator.evaluate(&profile, three_days_left) {
        assert_eq!(gate.visible(trial_reminder).unwrap(), None);
    }
    if let AppState::MainApp { trial_reminder } = evaluator.evaluate(&profile, one_day_left) {
        assert_eq!(gate.visible(trial_reminder).unwrap().map(|r| r.days_remaining), Some(1));
    }
}

#[test]
fn test_raw_row_with_no_access_path() {
    let row: ProfileRow = serde_json::from_str(
        r#"{
            "id": "0d9a3f4e-2b1c-4c8e-9f3a-7b6d5e4c3b2a",
            "onboarding_completed_at": "2024-01-01",
            "subscription_status": "inactive",
            "subscription_granted_by": null,
            "promo_expires_at": null,
            "free_tier_chosen_at": null,
            "trial_expires_at": null,
            "email": "nobody@x.com"
        }"#,
    )
    .unwrap();
    let profile = row.normalize().unwrap();
    let evaluator = AccessEvaluator::new(BetaAllowList::new(["beta@x.com"]));

    for offset in [-10_000i64, 0, 10_000] {
        assert_eq!(
            evaluator.evaluate(&profile, start() + Duration::days(offset)),
            AppState::PaywallRequired {
                trial_expired: false
            }
        );
    }
}

#[test]
fn test_beta_tester_from_config_overrides_expired_everything() {
    let mut config = Config::default();
    config.add_beta_tester("Beta@X.com");
    let evaluator = AccessEvaluator::new(config.beta_allow_list());

    let row = ProfileRow {
        id: Uuid::new_v4().to_string(),
        email: Some("beta@x.com".into()),
        onboarding_completed_at: Some("2024-01-01T00:00:00Z".into()),
        promo_expires_at: Some("2024-02-01T00:00:00Z".into()),
        trial_expires_at: Some("2024-02-01T00:00:00Z".into()),
        free_tier_chosen_at: Some("2024-01-25T00:00:00Z".into()),
        ..Default::default()
    };
    let profile = row.normalize().unwrap();
    assert!(evaluator.evaluate(&profile, start()).is_main_app());
}

#[test]
fn test_promo_restores_access_after_trial() {
    let evaluator = AccessEvaluator::default();
    let id = Uuid::new_v4();
    let db = Database::open_memory().unwrap();

    let mut profile = db.fetch_or_create(id, "c@x.com", None).unwrap();
    profile.complete_onboarding(Role::Student, start());
    choose_free_tier(&profile, start(), Duration::days(7))
        .unwrap()
        .apply(&mut profile);

    let later = start() + Duration::days(10);
    assert_eq!(
        evaluator.evaluate(&profile, later),
        AppState::PaywallRequired { trial_expired: true }
    );

    redeem_promo(&profile, &PromoGrant::new("CREATOR", 30), later)
        .unwrap()
        .apply(&mut profile);
    db.save(&profile).unwrap();

    assert_eq!(
        evaluator.evaluate(&db.require(id).unwrap(), later),
        AppState::MainApp {
            trial_reminder: None
        }
    );
}
