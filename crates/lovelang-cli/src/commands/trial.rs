use clap::Subcommand;
use lovelang_core::{choose_free_tier, trial_status, Config, CoreError, Database, ProfileStore};
use uuid::Uuid;

use super::{print_json, print_optional_time, CliResult, ClockArgs};

#[derive(Subcommand)]
pub enum TrialAction {
    /// Show trial status for a profile
    Status {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        clock: ClockArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Activate the free tier and start the trial
    Start {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        clock: ClockArgs,
    },
}

pub fn run(action: TrialAction) -> CliResult {
    match action {
        TrialAction::Status { id, clock, json } => {
            let db = Database::open()?;
            let profile = db.require(id)?;
            let status = trial_status(&profile, clock.now());
            if json {
                return print_json(&status);
            }
            print_optional_time("expires_at", status.trial_expires_at);
            match status.days_remaining {
                Some(days) => println!("days_remaining: {days}"),
                None => println!("days_remaining: -"),
            }
            if let Some(hours) = status.hours_remaining {
                println!("hours_remaining: {hours}");
            }
            println!("grandfathered: {}", status.is_grandfathered);
            println!("expired: {}", status.trial_expired);
            println!("has_access: {}", status.has_access);
            Ok(())
        }
        TrialAction::Start { id, clock } => {
            let config = Config::load()?;
            let db = Database::open()?;
            let mut profile = db.require(id)?;
            let grant = choose_free_tier(&profile, clock.now(), config.trial_length())
                .map_err(CoreError::from)?;
            grant.apply(&mut profile);
            db.save(&profile)?;
            println!("trial started, expires {}", grant.trial_expires_at.to_rfc3339());
            Ok(())
        }
    }
}
