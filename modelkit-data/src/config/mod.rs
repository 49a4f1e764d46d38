mod loader;
mod settings;
pub mod value;

use std::collections::HashMap;
use std::path::Path;

pub use settings::DataSettings;
pub use value::{ConfigValue, FromConfigValue};

/// Environment variable that selects the active profile.
pub const PROFILE_ENV: &str = "MODELKIT_PROFILE";

#[derive(Debug)]
pub enum ConfigError {
    /// The requested key was not found in the configuration.
    NotFound(String),
    /// The value could not be converted to the requested type.
    TypeMismatch { key: String, expected: &'static str },
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// The value has the right type but is not an accepted setting.
    Invalid { key: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(key) => write!(f, "Config key not found: {key}"),
            ConfigError::TypeMismatch { key, expected } => {
                write!(f, "Config type mismatch for '{key}': expected {expected}")
            }
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid { key, message } => {
                write!(f, "Invalid config value for '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration loaded from YAML files, `.env` files, and environment variables.
///
/// Resolution order (lowest to highest priority):
/// 1. `application.yaml`
/// 2. `application-{profile}.yaml`
/// 3. `.env` then `.env.{profile}` (loaded into the process environment,
///    never overwriting variables that are already set)
/// 4. Environment variables (`DATA_PAGINATION_LIMIT` overrides `data.pagination.limit`)
///
/// The profile comes from `MODELKIT_PROFILE` if set, otherwise from the argument.
#[derive(Debug, Clone)]
pub struct DataConfig {
    values: HashMap<String, ConfigValue>,
    profile: String,
}

impl DataConfig {
    /// Load from the current working directory.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Load from `dir` instead of the working directory.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile = std::env::var(PROFILE_ENV).unwrap_or_else(|_| profile.to_string());

        let mut values = HashMap::new();
        loader::load_yaml_file(&dir.join("application.yaml"), &mut values)?;
        loader::load_yaml_file(
            &dir.join(format!("application-{active_profile}.yaml")),
            &mut values,
        )?;
        loader::load_env_files(dir, &active_profile);
        loader::overlay_env(&mut values);

        tracing::debug!(profile = %active_profile, keys = values.len(), "configuration loaded");
        Ok(DataConfig {
            values,
            profile: active_profile,
        })
    }

    /// Build from a YAML string, without env overlay.
    pub fn from_yaml_str(yaml: &str, profile: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        loader::load_yaml_str(yaml, &mut values)?;
        Ok(DataConfig {
            values,
            profile: profile.to_string(),
        })
    }

    pub fn empty() -> Self {
        DataConfig {
            values: HashMap::new(),
            profile: "test".to_string(),
        }
    }

    pub fn set(&mut self, key: &str, value: ConfigValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Typed value for a dot-separated key.
    pub fn get<V: FromConfigValue>(&self, key: &str) -> Result<V, ConfigError> {
        let value = self
            .values
            .get(key)
            .ok_or_else(|| ConfigError::NotFound(key.to_string()))?;
        V::from_config_value(value, key)
    }

    /// Like `get`, but a missing key yields `default`. A present value of the
    /// wrong type is still an error.
    pub fn get_or<V: FromConfigValue>(&self, key: &str, default: V) -> Result<V, ConfigError> {
        match self.values.get(key) {
            Some(value) => V::from_config_value(value, key),
            None => Ok(default),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_typed_values() {
        let config = DataConfig::from_yaml_str(
            "data:\n  database:\n    url: sqlite::memory:\n    connections: 3\n",
            "test",
        )
        .unwrap();
        assert_eq!(config.get::<String>("data.database.url").unwrap(), "sqlite::memory:");
        assert_eq!(config.get::<u32>("data.database.connections").unwrap(), 3);
        assert!(matches!(
            config.get::<String>("data.missing"),
            Err(ConfigError::NotFound(_))
        ));
        assert_eq!(config.get_or("data.missing", 7u64).unwrap(), 7);
    }

    #[test]
    #[serial]
    fn test_profile_file_overrides_base() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("application.yaml"),
            "data:\n  pagination:\n    limit: 10\n  softdelete:\n    column: deletedAt\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("application-staging.yaml"),
            "data:\n  pagination:\n    limit: 50\n",
        )
        .unwrap();

        let config = DataConfig::load_from(dir.path(), "staging").unwrap();
        assert_eq!(config.profile(), "staging");
        assert_eq!(config.get::<u64>("data.pagination.limit").unwrap(), 50);
        assert_eq!(config.get::<String>("data.softdelete.column").unwrap(), "deletedAt");
    }

    #[test]
    #[serial]
    fn test_env_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("application.yaml"),
            "data:\n  querylog:\n    level: debug\n",
        )
        .unwrap();
        std::env::set_var("DATA_QUERYLOG_LEVEL", "warn");
        let config = DataConfig::load_from(dir.path(), "dev");
        std::env::remove_var("DATA_QUERYLOG_LEVEL");

        assert_eq!(
            config.unwrap().get::<String>("data.querylog.level").unwrap(),
            "warn"
        );
    }

    #[test]
    #[serial]
    fn test_missing_files_are_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = DataConfig::load_from(dir.path(), "dev").unwrap();
        assert!(!config.contains_key("data.pagination.limit"));
    }
}
