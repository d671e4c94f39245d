//! Trial reminder commands.
//!
//! Dismissals are stored in the local database, one flag per boundary day,
//! so the same boundary is not shown twice on this machine.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use lovelang_core::reminder::REMINDER_BOUNDARY_DAYS;
use lovelang_core::{compute_reminder, Config, Database, ReminderGate};

use super::{parse_instant, print_json, CliResult, ClockArgs};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Check whether a reminder should show for a trial expiry
    Check {
        /// Trial expiry instant
        #[arg(long, value_parser = parse_instant)]
        expires_at: DateTime<Utc>,
        #[command(flatten)]
        clock: ClockArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Dismiss the reminder for a boundary day
    Dismiss {
        /// Days remaining (5, 3, 1 or 0)
        #[arg(long)]
        days: u32,
    },
    /// Forget all dismissals
    Reset,
}

pub fn run(action: ReminderAction) -> CliResult {
    match action {
        ReminderAction::Check {
            expires_at,
            clock,
            json,
        } => check(expires_at, &clock, json),
        ReminderAction::Dismiss { days } => dismiss(days),
        ReminderAction::Reset => reset(),
    }
}

fn check(expires_at: DateTime<Utc>, clock: &ClockArgs, json: bool) -> CliResult {
    let config = Config::load()?;
    let gate = ReminderGate::new(Database::open()?).with_enabled(config.reminders.enabled);
    let eligible = compute_reminder(Some(expires_at), clock.now());
    let visible = gate.visible(eligible)?;

    if json {
        return print_json(&serde_json::json!({
            "eligible": eligible,
            "visible": visible,
            "message": visible.map(|r| r.message()),
        }));
    }

    match (eligible, visible) {
        (None, _) => println!("no reminder"),
        (Some(info), None) => println!("dismissed: {} days remaining", info.days_remaining),
        (Some(info), Some(_)) => {
            let message = info.message();
            println!("{}", message.title);
            println!("{}", message.subtitle);
        }
    }
    Ok(())
}

fn dismiss(days: u32) -> CliResult {
    if !REMINDER_BOUNDARY_DAYS.contains(&days) {
        return Err(format!("{days} is not a reminder day (expected one of 5, 3, 1, 0)").into());
    }
    let mut gate = ReminderGate::new(Database::open()?);
    gate.dismiss_day(days)?;
    println!("dismissed day {days}");
    Ok(())
}

fn reset() -> CliResult {
    let mut gate = ReminderGate::new(Database::open()?);
    gate.reset()?;
    println!("reminder dismissals cleared");
    Ok(())
}
