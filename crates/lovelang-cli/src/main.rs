use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "lovelang-cli", version, about = "Love Languages access CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Access decisions for a profile
    Access {
        #[command(subcommand)]
        action: commands::access::AccessAction,
    },
    /// Trial reminder checks and dismissals
    Reminder {
        #[command(subcommand)]
        action: commands::reminder::ReminderAction,
    },
    /// Free trial status and activation
    Trial {
        #[command(subcommand)]
        action: commands::trial::TrialAction,
    },
    /// Effective subscription plan
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Creator promo redemption
    Promo {
        #[command(subcommand)]
        action: commands::promo::PromoAction,
    },
    /// Local profile management
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Beta-tester allow-list management
    Beta {
        #[command(subcommand)]
        action: commands::beta::BetaAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOVELANG_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Access { action } => commands::access::run(action),
        Commands::Reminder { action } => commands::reminder::run(action),
        Commands::Trial { action } => commands::trial::run(action),
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Promo { action } => commands::promo::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Beta { action } => commands::beta::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
