//! Configuration loading and management
//!
//! Handles parsing of the optional `config.toml` in the data directory.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::{validate_key, LAST_ACCESS_KEY, TASKS_KEY};
use crate::task::Priority;

/// File name of the configuration inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub tasks: TasksConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserConfig {
    /// Name used in the welcome message
    #[serde(default = "default_user_name")]
    pub name: String,
}

fn default_user_name() -> String {
    "you".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TasksConfig {
    /// Priority given to new tasks when none is specified (1-3)
    #[serde(default = "default_priority")]
    pub default_priority: u8,
}

fn default_priority() -> u8 {
    Priority::default().value()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ValidationConfig {
    /// Re-check the name length when an edit is saved
    #[serde(default)]
    pub on_edit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReminderConfig {
    /// Show the new-day reminder at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Key holding the task list
    #[serde(default = "default_tasks_key")]
    pub tasks_key: String,

    /// Key holding the last-access timestamp
    #[serde(default = "default_last_access_key")]
    pub last_access_key: String,

    /// How long to wait for the data directory lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_tasks_key() -> String {
    TASKS_KEY.to_string()
}

fn default_last_access_key() -> String {
    LAST_ACCESS_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_key: default_tasks_key(),
            last_access_key: default_last_access_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `config.toml` from the data directory, or return defaults when
    /// the file does not exist. A file that exists but is invalid is an error.
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Default priority for new tasks.
    pub fn default_priority(&self) -> Priority {
        Priority::new(self.tasks.default_priority).unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if self.user.name.trim().is_empty() {
            return Err(Error::InvalidConfig("user.name cannot be empty".to_string()));
        }

        Priority::new(self.tasks.default_priority).map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_priority must be 1, 2 or 3 (got {})",
                self.tasks.default_priority
            ))
        })?;

        self.storage.validate()
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        validate_key(&self.tasks_key)
            .map_err(|err| Error::InvalidConfig(format!("storage.tasks_key: {err}")))?;
        validate_key(&self.last_access_key)
            .map_err(|err| Error::InvalidConfig(format!("storage.last_access_key: {err}")))?;

        if self.tasks_key == self.last_access_key {
            return Err(Error::InvalidConfig(
                "storage.tasks_key and storage.last_access_key must differ".to_string(),
            ));
        }
        if self.tasks_key == CONFIG_FILE || self.last_access_key == CONFIG_FILE {
            return Err(Error::InvalidConfig(format!(
                "storage keys cannot be named '{CONFIG_FILE}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.user.name, "you");
        assert_eq!(cfg.tasks.default_priority, 3);
        assert_eq!(cfg.default_priority(), Priority::LOW);
        assert!(!cfg.validation.on_edit);
        assert!(cfg.reminder.enabled);
        assert_eq!(cfg.storage.tasks_key, "TodoApp");
        assert_eq!(cfg.storage.last_access_key, "LastAccess");
        assert_eq!(cfg.storage.lock_timeout_ms, DEFAULT_LOCK_TIMEOUT_MS);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        let content = r#"
[user]
name = "Mika"

[tasks]
default_priority = 1

[validation]
on_edit = true

[reminder]
enabled = false

[storage]
tasks_key = "tasks.json"
last_access_key = "last-access"
lock_timeout_ms = 250
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.user.name, "Mika");
        assert_eq!(cfg.default_priority(), Priority::HIGH);
        assert!(cfg.validation.on_edit);
        assert!(!cfg.reminder.enabled);
        assert_eq!(cfg.storage.tasks_key, "tasks.json");
        assert_eq!(cfg.storage.last_access_key, "last-access");
        assert_eq!(cfg.storage.lock_timeout_ms, 250);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[user]\nname = \"Ren\"").expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.user.name, "Ren");
        assert_eq!(cfg.tasks, TasksConfig::default());
        assert!(cfg.reminder.enabled);
    }

    #[test]
    fn invalid_priority_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[tasks]\ndefault_priority = 5").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_storage_keys_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        for content in [
            "[storage]\ntasks_key = \"../outside\"",
            "[storage]\ntasks_key = \"same\"\nlast_access_key = \"same\"",
            "[storage]\nlast_access_key = \"config.toml\"",
        ] {
            fs::write(&path, content).expect("write config");
            let err = Config::load(&path).expect_err("invalid config");
            assert!(matches!(err, Error::InvalidConfig(_)), "{content}: {err:?}");
        }
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[user\nname = ").expect("write config");
        assert!(matches!(Config::load(&path), Err(Error::TomlParse(_))));
    }

    #[test]
    fn load_from_dir_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_dir(dir.path()).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_dir_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILE), "[user]\nname = \"Kai\"").expect("write config");

        let cfg = Config::load_from_dir(dir.path()).expect("load");
        assert_eq!(cfg.user.name, "Kai");
    }
}
