use clap::Subcommand;
use lovelang_core::{redeem_promo, CoreError, Database, ProfileStore, PromoGrant};
use uuid::Uuid;

use super::{CliResult, ClockArgs};

#[derive(Subcommand)]
pub enum PromoAction {
    /// Redeem a validated promo code for a profile
    Redeem {
        #[arg(long)]
        id: Uuid,
        /// Promo code
        #[arg(long)]
        code: String,
        /// Days of access the code grants
        #[arg(long)]
        days: u32,
        #[command(flatten)]
        clock: ClockArgs,
    },
}

pub fn run(action: PromoAction) -> CliResult {
    match action {
        PromoAction::Redeem {
            id,
            code,
            days,
            clock,
        } => {
            let db = Database::open()?;
            let mut profile = db.require(id)?;
            let redemption = redeem_promo(&profile, &PromoGrant::new(code, days), clock.now())
                .map_err(CoreError::from)?;
            redemption.apply(&mut profile);
            db.save(&profile)?;
            println!(
                "promo {} redeemed: {} days, expires {}",
                redemption.code,
                redemption.days_granted,
                redemption.expires_at.to_rfc3339()
            );
            Ok(())
        }
    }
}
