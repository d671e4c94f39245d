//! TOML-based application configuration.
//!
//! Stores deploy-time settings:
//! - Beta-tester allow-list
//! - Free trial length
//! - Trial reminder switch
//!
//! Configuration is stored at `~/.config/lovelang/config.toml`.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::data_dir;
use crate::access::{normalize_email, BetaAllowList};
use crate::error::ConfigError;
use crate::trial::DEFAULT_TRIAL_LENGTH_DAYS;

/// Access configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Emails granted access regardless of billing state.
    #[serde(default)]
    pub beta_testers: Vec<String>,
}

/// Free trial configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialConfig {
    #[serde(default = "default_trial_length_days")]
    pub length_days: u32,
}

/// Trial reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/lovelang/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub trial: TrialConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
}

fn default_trial_length_days() -> u32 {
    DEFAULT_TRIAL_LENGTH_DAYS
}
fn default_true() -> bool {
    true
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            length_days: default_trial_length_days(),
        }
    }
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Array(_) => {
                        if value.trim_start().starts_with('[') {
                            serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                        } else {
                            serde_json::Value::Array(
                                value
                                    .split(',')
                                    .map(str::trim)
                                    .filter(|s| !s.is_empty())
                                    .map(|s| serde_json::Value::String(s.to_string()))
                                    .collect(),
                            )
                        }
                    }
                    serde_json::Value::Object(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return (and persist) the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                info!(path = %path.display(), "wrote default config");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a value by dot-separated key. Does not persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Beta allow-list to inject into the access evaluator.
    pub fn beta_allow_list(&self) -> BetaAllowList {
        BetaAllowList::new(&self.access.beta_testers)
    }

    pub fn trial_length(&self) -> Duration {
        Duration::days(i64::from(self.trial.length_days))
    }

    /// Add an email to the allow-list. Returns false if already present.
    pub fn add_beta_tester(&mut self, email: &str) -> bool {
        let email = normalize_email(email);
        if email.is_empty() || self.beta_allow_list().contains(&email) {
            return false;
        }
        self.access.beta_testers.push(email);
        true
    }

    /// Remove an email from the allow-list. Returns false if absent.
    pub fn remove_beta_tester(&mut self, email: &str) -> bool {
        let email = normalize_email(email);
        let before = self.access.beta_testers.len();
        self.access
            .beta_testers
            .retain(|existing| normalize_email(existing) != email);
        self.access.beta_testers.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.trial.length_days, 7);
        assert!(parsed.reminders.enabled);
        assert!(parsed.access.beta_testers.is_empty());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[access]\nbeta_testers = [\"A@B.C\"]\n").unwrap();
        assert_eq!(parsed.trial.length_days, 7);
        assert!(parsed.beta_allow_list().contains("a@b.c"));
    }

    #[test]
    fn get_by_dotted_key() {
        let cfg = Config::default();
        assert_eq!(cfg.get("trial.length_days").as_deref(), Some("7"));
        assert_eq!(cfg.get("reminders.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("nope"), None);
        assert_eq!(cfg.get(""), None);
    }

    #[test]
    fn set_preserves_types() {
        let mut cfg = Config::default();
        cfg.set("trial.length_days", "14").unwrap();
        cfg.set("reminders.enabled", "false").unwrap();
        cfg.set("access.beta_testers", "a@b.c, d@e.f").unwrap();
        assert_eq!(cfg.trial.length_days, 14);
        assert!(!cfg.reminders.enabled);
        assert_eq!(cfg.access.beta_testers, vec!["a@b.c", "d@e.f"]);
        assert_eq!(cfg.trial_length(), Duration::days(14));
    }

    #[test]
    fn set_rejects_unknown_and_mistyped() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("trial.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("trial.length_days", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn beta_tester_management_is_case_insensitive() {
        let mut cfg = Config::default();
        assert!(cfg.add_beta_tester("Tester@Example.com"));
        assert!(!cfg.add_beta_tester("tester@example.COM"));
        assert!(cfg.beta_allow_list().contains("TESTER@example.com"));
        assert!(cfg.remove_beta_tester(" tester@EXAMPLE.com"));
        assert!(!cfg.remove_beta_tester("tester@example.com"));
        assert!(cfg.beta_allow_list().is_empty());
    }

    #[test]
    fn load_writes_default_then_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.trial.length_days, 7);

        let mut cfg = cfg;
        cfg.add_beta_tester("x@y.z");
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.access.beta_testers, vec!["x@y.z"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "trial = 12").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
