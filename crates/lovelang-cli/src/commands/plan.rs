use clap::Subcommand;
use lovelang_core::{require_subscription, resolve_plan, Database, ProfileStore};
use uuid::Uuid;

use super::{print_json, CliResult, ClockArgs};

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print the plan used for usage limits
    Show {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Check whether the profile may use subscriber features
    Require {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        clock: ClockArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: PlanAction) -> CliResult {
    let db = Database::open()?;
    match action {
        PlanAction::Show { id, clock } => {
            let profile = db.require(id)?;
            println!("{}", resolve_plan(&profile, clock.now()));
        }
        PlanAction::Require { id, clock, json } => {
            let profile = db.require(id)?;
            let check = require_subscription(&profile, clock.now());
            if json {
                return print_json(&check);
            }
            if check.allowed {
                println!("allowed ({})", check.plan);
            } else {
                println!("denied: {}", check.reason.unwrap_or_default());
            }
        }
    }
    Ok(())
}
