//! Core error types for lovelang-core.
//!
//! The decision functions (`evaluate`, `compute_reminder`, `resolve_plan`,
//! `trial_status`) are total and never fail. Errors only arise at the edges:
//! importing raw profile rows, reading configuration, talking to SQLite,
//! and lifecycle operations the user is not eligible for.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lovelang-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Profile import and lookup errors
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// A lifecycle operation was refused for this profile
    #[error("Refused ({code}): {0}", code = .0.code())]
    Refused(#[from] AccessRefusal),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded
    #[error("Corrupt row for '{key}': {message}")]
    CorruptRow { key: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Profile import and lookup errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// The row's id is not a UUID
    #[error("Invalid profile id: '{0}'")]
    InvalidId(String),

    /// No profile stored under this id
    #[error("Profile not found: {0}")]
    NotFound(uuid::Uuid),

    /// Unrecognized enum value supplied by a caller
    #[error("Invalid value for '{field}': '{value}'")]
    InvalidValue { field: String, value: String },
}

/// Reasons a lifecycle operation (free-tier activation, promo redemption)
/// is refused. Each carries the stable machine code used by API clients.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRefusal {
    #[error("You already have an active subscription")]
    AlreadySubscribed,

    #[error("You already have access through your partner")]
    HasPartnerAccess,

    /// Free-tier activation while a promo is running
    #[error("You already have active creator access")]
    HasPromoAccess,

    #[error("You have already activated the free tier")]
    AlreadyFreeTier,

    /// Promo redemption while a promo is running
    #[error("You already have active creator access")]
    AlreadyHasPromo,

    #[error("Promo grant must have a code and a valid number of days")]
    InvalidGrant,

    /// Configured trial length runs past the representable date range
    #[error("Trial length is out of range")]
    InvalidTrialLength,
}

impl AccessRefusal {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AccessRefusal::AlreadySubscribed => "ALREADY_SUBSCRIBED",
            AccessRefusal::HasPartnerAccess => "HAS_PARTNER_ACCESS",
            AccessRefusal::HasPromoAccess => "HAS_PROMO_ACCESS",
            AccessRefusal::AlreadyFreeTier => "ALREADY_FREE_TIER",
            AccessRefusal::AlreadyHasPromo => "ALREADY_HAS_PROMO",
            AccessRefusal::InvalidGrant => "INVALID_GRANT",
            AccessRefusal::InvalidTrialLength => "INVALID_TRIAL_LENGTH",
        }
    }
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
