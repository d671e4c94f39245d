//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Profile snapshots (the local stand-in for the hosted profiles table)
//! - Key-value store for client state such as reminder dismissals

use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

use super::data_dir;
use crate::error::{DatabaseError, ProfileError, Result};
use crate::profile::{ProfileId, ProfileSnapshot};
use crate::reminder::DismissalStore;

/// Source of profile snapshots.
///
/// Creates the profile row on first sign-in and hands out snapshots
/// afterwards. Implementations own persistence; decision code only ever
/// sees the returned values.
pub trait ProfileStore {
    fn fetch(&self, id: ProfileId) -> Result<Option<ProfileSnapshot>>;

    fn save(&self, profile: &ProfileSnapshot) -> Result<()>;

    fn list(&self) -> Result<Vec<ProfileSnapshot>>;

    /// Fetch the profile, creating the default row if it does not exist.
    fn fetch_or_create(
        &self,
        id: ProfileId,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<ProfileSnapshot> {
        if let Some(existing) = self.fetch(id)? {
            return Ok(existing);
        }
        let profile = ProfileSnapshot::bootstrap(id, email, full_name);
        self.save(&profile)?;
        info!(profile = %id, "profile created");
        Ok(profile)
    }

    /// Fetch a profile that must already exist.
    fn require(&self, id: ProfileId) -> Result<ProfileSnapshot> {
        self.fetch(id)?
            .ok_or_else(|| ProfileError::NotFound(id).into())
    }
}

/// SQLite database for local profile and client state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/lovelang/lovelang.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("lovelang.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        info!(path = %path.display(), "database ready");
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS profiles (
                    id          TEXT PRIMARY KEY,
                    email       TEXT NOT NULL DEFAULT '',
                    data        TEXT NOT NULL,
                    updated_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_profiles_email ON profiles(email);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn decode(key: &str, data: &str) -> Result<ProfileSnapshot, DatabaseError> {
        serde_json::from_str(data).map_err(|e| DatabaseError::CorruptRow {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

impl ProfileStore for Database {
    fn fetch(&self, id: ProfileId) -> Result<Option<ProfileSnapshot>> {
        let key = id.to_string();
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM profiles WHERE id = ?1")
            .map_err(DatabaseError::from)?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(data) => Ok(Some(Self::decode(&key, &data)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::from(e).into()),
        }
    }

    fn save(&self, profile: &ProfileSnapshot) -> Result<()> {
        let data = serde_json::to_string(profile)?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO profiles (id, email, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    profile.id.to_string(),
                    profile.email,
                    data,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<ProfileSnapshot>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, data FROM profiles ORDER BY email, id")
            .map_err(DatabaseError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(DatabaseError::from)?;

        let mut profiles = Vec::new();
        for row in rows {
            let (key, data) = row.map_err(DatabaseError::from)?;
            profiles.push(Self::decode(&key, &data)?);
        }
        Ok(profiles)
    }
}

impl DismissalStore for Database {
    type Error = DatabaseError;

    fn is_dismissed(&self, key: &str) -> Result<bool, Self::Error> {
        Ok(self.kv_get(key)?.as_deref() == Some("true"))
    }

    fn set_dismissed(&mut self, key: &str, dismissed: bool) -> Result<(), Self::Error> {
        self.kv_set(key, if dismissed { "true" } else { "false" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Role, SubscriptionPlan};
    use crate::reminder::{ReminderGate, ReminderInfo};
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
    }

    #[test]
    fn fetch_or_create_bootstraps_once() {
        let db = Database::open_memory().unwrap();
        let id = Uuid::new_v4();

        let created = db.fetch_or_create(id, "ana@example.com", None).unwrap();
        assert_eq!(created.full_name, "Lover");
        assert_eq!(created.role, Some(Role::Student));

        let mut updated = created.clone();
        updated.activate_subscription(SubscriptionPlan::Standard);
        db.save(&updated).unwrap();

        let again = db.fetch_or_create(id, "other@example.com", Some("Other")).unwrap();
        assert_eq!(again, updated);
        assert_eq!(db.list().unwrap().len(), 1);
    }

    #[test]
    fn require_missing_profile_is_not_found() {
        let db = Database::open_memory().unwrap();
        let id = Uuid::new_v4();
        let err = db.require(id).unwrap_err();
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn dismissals_persist_across_connections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lovelang.db");
        let info = ReminderInfo {
            days_remaining: 3,
            hours_remaining: None,
        };

        {
            let mut gate = ReminderGate::new(Database::open_at(&path).unwrap());
            assert_eq!(gate.visible(Some(info)).unwrap(), Some(info));
            gate.dismiss(&info).unwrap();
        }

        let gate = ReminderGate::new(Database::open_at(&path).unwrap());
        assert_eq!(gate.visible(Some(info)).unwrap(), None);
        assert_eq!(
            gate.store().kv_get("trial_reminder_dismissed_3").unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn corrupt_profile_row_is_reported() {
        let db = Database::open_memory().unwrap();
        let id = Uuid::new_v4();
        db.conn()
            .execute(
                "INSERT INTO profiles (id, email, data, updated_at) VALUES (?1, '', '{', '')",
                params![id.to_string()],
            )
            .unwrap();
        assert!(db.fetch(id).is_err());
    }
}
