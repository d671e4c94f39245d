pub mod access;
pub mod beta;
pub mod config;
pub mod plan;
pub mod profile;
pub mod promo;
pub mod reminder;
pub mod trial;

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use lovelang_core::profile::parse_timestamp;
use lovelang_core::{Database, ProfileRow, ProfileSnapshot, ProfileStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Parse `--now` style arguments: RFC 3339 or `YYYY-MM-DD`.
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| format!("invalid timestamp '{raw}' (expected RFC 3339 or YYYY-MM-DD)"))
}

/// Evaluation instant; defaults to the wall clock.
#[derive(Args, Debug, Clone)]
pub struct ClockArgs {
    /// Evaluate as of this instant instead of now
    #[arg(long, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,
}

impl ClockArgs {
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// A stored profile id or a raw profile row exported from the backend.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ProfileSource {
    /// Stored profile id
    #[arg(long)]
    pub id: Option<Uuid>,
    /// JSON file holding a raw profile row
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl ProfileSource {
    pub fn load(&self, db: &Database) -> Result<ProfileSnapshot, Box<dyn std::error::Error>> {
        match (&self.id, &self.file) {
            (Some(id), _) => Ok(db.require(*id)?),
            (None, Some(path)) => read_profile_row(path),
            (None, None) => Err("either --id or --file is required".into()),
        }
    }
}

pub fn read_profile_row(path: &PathBuf) -> Result<ProfileSnapshot, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let row: ProfileRow = serde_json::from_str(&content)?;
    Ok(row.normalize()?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_optional_time(label: &str, value: Option<DateTime<Utc>>) {
    match value {
        Some(t) => println!("{label}: {}", t.to_rfc3339()),
        None => println!("{label}: -"),
    }
}
