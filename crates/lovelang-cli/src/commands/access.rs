//! Access decision commands.

use clap::Subcommand;
use lovelang_core::{AccessEvaluator, AppState, Config, Database, ReminderGate};

use super::{print_json, CliResult, ClockArgs, ProfileSource};

#[derive(Subcommand)]
pub enum AccessAction {
    /// Decide which screen a profile sees
    Evaluate {
        #[command(flatten)]
        source: ProfileSource,
        #[command(flatten)]
        clock: ClockArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Skip the dismissal filter and show any eligible reminder
        #[arg(long)]
        ignore_dismissals: bool,
    },
    /// Show every access predicate for a profile
    Flags {
        #[command(flatten)]
        source: ProfileSource,
        #[command(flatten)]
        clock: ClockArgs,
    },
}

pub fn run(action: AccessAction) -> CliResult {
    match action {
        AccessAction::Evaluate {
            source,
            clock,
            json,
            ignore_dismissals,
        } => evaluate(&source, &clock, json, ignore_dismissals),
        AccessAction::Flags { source, clock } => flags(&source, &clock),
    }
}

fn evaluate(source: &ProfileSource, clock: &ClockArgs, json: bool, ignore_dismissals: bool) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let profile = source.load(&db)?;
    let evaluator = AccessEvaluator::new(config.beta_allow_list());

    let mut state = evaluator.evaluate(&profile, clock.now());
    if let AppState::MainApp { trial_reminder } = &mut state {
        if !ignore_dismissals {
            let gate = ReminderGate::new(db).with_enabled(config.reminders.enabled);
            *trial_reminder = gate.visible(*trial_reminder)?;
        }
    }

    if json {
        return print_json(&state);
    }

    println!("state: {}", state.name());
    match state {
        AppState::NeedsOnboarding { role } => {
            let role = role.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
            println!("role: {role}");
        }
        AppState::PaywallRequired { trial_expired } => {
            println!("trial_expired: {trial_expired}");
        }
        AppState::MainApp { trial_reminder } => match trial_reminder {
            Some(info) => {
                let message = info.message();
                println!("reminder: {} ({})", message.title, message.subtitle);
            }
            None => println!("reminder: -"),
        },
    }
    Ok(())
}

fn flags(source: &ProfileSource, clock: &ClockArgs) -> CliResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let profile = source.load(&db)?;
    let evaluator = AccessEvaluator::new(config.beta_allow_list());

    let flags = evaluator.flags(&profile, clock.now());
    let mut value = serde_json::to_value(flags)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("has_access".into(), flags.has_access().into());
        obj.insert(
            "expired_trial_paywall".into(),
            flags.expired_trial_paywall().into(),
        );
    }
    print_json(&value)
}
