//! Beta tester allow-list management.

use clap::Subcommand;
use lovelang_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum BetaAction {
    /// Add an email to the allow-list
    Add { email: String },
    /// Remove an email from the allow-list
    Remove { email: String },
    /// List allow-listed emails
    List,
}

pub fn run(action: BetaAction) -> CliResult {
    let mut config = Config::load()?;
    match action {
        BetaAction::Add { email } => {
            if config.add_beta_tester(&email) {
                config.save()?;
                println!("added {}", email.trim().to_lowercase());
            } else {
                println!("already listed");
            }
        }
        BetaAction::Remove { email } => {
            if config.remove_beta_tester(&email) {
                config.save()?;
                println!("removed {}", email.trim().to_lowercase());
            } else {
                return Err(format!("{email} is not on the allow-list").into());
            }
        }
        BetaAction::List => {
            for email in &config.access.beta_testers {
                println!("{email}");
            }
        }
    }
    Ok(())
}
