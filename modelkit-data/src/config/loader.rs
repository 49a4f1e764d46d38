use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Load and flatten a YAML file. A missing file is not an error.
pub(crate) fn load_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    load_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

pub(crate) fn load_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten_yaml("", &yaml, values);
    Ok(())
}

/// Load `.env` style files into the process environment.
///
/// Variables that are already set are left alone.
pub(crate) fn load_env_files(dir: &Path, profile: &str) {
    let _ = dotenvy::from_path(dir.join(".env"));
    let _ = dotenvy::from_path(dir.join(format!(".env.{profile}")));
}

/// `DATA_DATABASE_URL` overrides `data.database.url`.
pub(crate) fn overlay_env(values: &mut HashMap<String, ConfigValue>) {
    for (env_key, env_val) in std::env::vars() {
        let config_key = env_key.to_lowercase().replace('_', ".");
        values.insert(config_key, ConfigValue::String(env_val));
    }
}

/// Flatten a YAML tree into dot-separated keys.
pub(crate) fn flatten_yaml(
    prefix: &str,
    value: &serde_yaml::Value,
    out: &mut HashMap<String, ConfigValue>,
) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => ConfigValue::from_yaml(other).to_string(),
                };
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_yaml(&full_key, v, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
            }
        }
    }
}
