//! Local profile management.
//!
//! These commands stand in for the backend writes that normally happen
//! through sign-in, onboarding, checkout webhooks and partner invites.

use clap::Subcommand;
use lovelang_core::{Database, ProfileStore, Role, SubscriptionPlan, SubscriptionStatus};
use std::path::PathBuf;
use uuid::Uuid;

use super::{print_json, print_optional_time, read_profile_row, CliResult, ClockArgs};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Create a profile the way first sign-in does
    Create {
        /// Profile id (random when omitted)
        #[arg(long)]
        id: Option<Uuid>,
        #[arg(long)]
        email: String,
        /// Display name (defaults to "Lover")
        #[arg(long)]
        name: Option<String>,
    },
    /// Show a stored profile
    Show {
        #[arg(long)]
        id: Uuid,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Store a raw profile row exported from the backend
    Import {
        /// JSON file holding the row
        file: PathBuf,
    },
    /// List stored profiles
    List,
    /// Complete onboarding with the chosen role
    Onboard {
        #[arg(long)]
        id: Uuid,
        /// student or tutor
        #[arg(long)]
        role: Role,
        #[command(flatten)]
        clock: ClockArgs,
    },
    /// Mark a paid subscription active
    Subscribe {
        #[arg(long)]
        id: Uuid,
        /// standard or unlimited
        #[arg(long, default_value = "standard")]
        plan: SubscriptionPlan,
    },
    /// Mark the subscription inactive
    Unsubscribe {
        #[arg(long)]
        id: Uuid,
        /// Status reported by billing
        #[arg(long, default_value = "canceled")]
        status: SubscriptionStatus,
    },
    /// Grant access inherited from a subscribed partner
    Grant {
        #[arg(long)]
        id: Uuid,
        /// Id of the granting partner
        #[arg(long)]
        by: String,
    },
    /// Remove inherited partner access
    Revoke {
        #[arg(long)]
        id: Uuid,
    },
}

pub fn run(action: ProfileAction) -> CliResult {
    let db = Database::open()?;
    match action {
        ProfileAction::Create { id, email, name } => {
            let id = id.unwrap_or_else(Uuid::new_v4);
            let profile = db.fetch_or_create(id, &email, name.as_deref())?;
            println!("{}", profile.id);
        }
        ProfileAction::Show { id, json } => {
            let profile = db.require(id)?;
            if json {
                return print_json(&profile);
            }
            println!("id: {}", profile.id);
            println!("email: {}", profile.email);
            println!("name: {}", profile.full_name);
            match profile.role {
                Some(role) => println!("role: {role}"),
                None => println!("role: -"),
            }
            print_optional_time("onboarded_at", profile.onboarding_completed_at);
            println!("subscription: {}", profile.subscription_status);
            match profile.subscription_plan {
                Some(plan) => println!("plan: {plan}"),
                None => println!("plan: -"),
            }
            println!(
                "granted_by: {}",
                profile.subscription_granted_by.as_deref().unwrap_or("-")
            );
            print_optional_time("promo_expires_at", profile.promo_expires_at);
            print_optional_time("free_tier_chosen_at", profile.free_tier_chosen_at);
            print_optional_time("trial_expires_at", profile.trial_expires_at);
        }
        ProfileAction::Import { file } => {
            let profile = read_profile_row(&file)?;
            db.save(&profile)?;
            println!("{}", profile.id);
        }
        ProfileAction::List => {
            for profile in db.list()? {
                println!("{}  {}  {}", profile.id, profile.email, profile.full_name);
            }
        }
        ProfileAction::Onboard { id, role, clock } => {
            let mut profile = db.require(id)?;
            profile.complete_onboarding(role, clock.now());
            db.save(&profile)?;
            println!("onboarded as {role}");
        }
        ProfileAction::Subscribe { id, plan } => {
            if !plan.is_paid() {
                return Err(format!("'{plan}' is not a paid plan").into());
            }
            let mut profile = db.require(id)?;
            profile.activate_subscription(plan);
            db.save(&profile)?;
            println!("subscription active ({plan})");
        }
        ProfileAction::Unsubscribe { id, status } => {
            if status.is_active() {
                return Err("status must be something other than active".into());
            }
            let mut profile = db.require(id)?;
            profile.deactivate_subscription(status.clone());
            db.save(&profile)?;
            println!("subscription {status}");
        }
        ProfileAction::Grant { id, by } => {
            let by = by.trim();
            if by.is_empty() {
                return Err("--by must not be blank".into());
            }
            let mut profile = db.require(id)?;
            profile.grant_partner_access(by);
            db.save(&profile)?;
            println!("partner access granted by {by}");
        }
        ProfileAction::Revoke { id } => {
            let mut profile = db.require(id)?;
            profile.revoke_partner_access();
            db.save(&profile)?;
            println!("partner access revoked");
        }
    }
    Ok(())
}
