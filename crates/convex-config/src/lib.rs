//! `Convex.toml` configuration
//!
//! A crate that runs the convex pipeline from its build script may place a `Convex.toml`
//! next to its `Cargo.toml`. Every key is optional; unset keys fall back to the defaults
//! documented on the accessors below.
//!
//! ```toml
//! verbose = true
//! crate-name = "my_app"
//! source-dirs = ["src"]
//! generate-registry = true
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up next to a crate's `Cargo.toml`
pub const CONFIG_FILE_NAME: &str = "Convex.toml";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "CONVEX_CONFIG";

/// Environment variable forcing verbose output (`1`, `true` or a level)
pub const VERBOSE_ENV: &str = "CONVEX_VERBOSE";

/// Keys accepted by [`Config::get`] and [`Config::set`]
pub const KNOWN_KEYS: &[&str] = &["verbose", "crate-name", "source-dirs", "generate-registry"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown config key: {0}. Supported keys: verbose, crate-name, source-dirs, generate-registry")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crate_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dirs: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generate_registry: Option<bool>,
}

impl Config {
    /// Resolve the config path for a crate directory.
    ///
    /// Honors `CONVEX_CONFIG` for tests and isolated runs.
    pub fn path_in(crate_dir: &Path) -> PathBuf {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }
        crate_dir.join(CONFIG_FILE_NAME)
    }

    /// Load the config for a crate directory, empty if the file doesn't exist
    pub fn load_from(crate_dir: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&Self::path_in(crate_dir))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Effective verbosity: `CONVEX_VERBOSE` wins over the `verbose` key
    pub fn verbosity(&self) -> u8 {
        verbosity_from_env(std::env::var(VERBOSE_ENV).ok().as_deref())
            .unwrap_or(u8::from(self.verbose.unwrap_or(false)))
    }

    /// Source directories relative to the crate root, `["src"]` by default
    pub fn source_dirs(&self) -> Vec<String> {
        self.source_dirs
            .clone()
            .filter(|dirs| !dirs.is_empty())
            .unwrap_or_else(|| vec!["src".to_string()])
    }

    /// Whether the build script should synthesize a registry, `true` by default
    pub fn generate_registry(&self) -> bool {
        self.generate_registry.unwrap_or(true)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "verbose" => self.verbose.map(|v| v.to_string()),
            "crate-name" => self.crate_name.clone(),
            "source-dirs" => self.source_dirs.as_ref().map(|dirs| dirs.join(",")),
            "generate-registry" => self.generate_registry.map(|v| v.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "verbose" => self.verbose = Some(value.parse().map_err(|_| invalid())?),
            "crate-name" => self.crate_name = Some(value.replace('-', "_")),
            "source-dirs" => {
                let dirs: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .collect();
                if dirs.is_empty() {
                    return Err(invalid());
                }
                self.source_dirs = Some(dirs);
            }
            "generate-registry" => {
                self.generate_registry = Some(value.parse().map_err(|_| invalid())?);
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.verbose.is_none()
            && self.crate_name.is_none()
            && self.source_dirs.is_none()
            && self.generate_registry.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KNOWN_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }
}

/// Interpret a `CONVEX_VERBOSE` value
pub fn verbosity_from_env(value: Option<&str>) -> Option<u8> {
    let value = value?.trim();
    match value.to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" => Some(0),
        "true" | "yes" => Some(1),
        other => other.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_empty());
        assert_eq!(config.source_dirs(), vec!["src".to_string()]);
        assert!(config.generate_registry());
    }

    #[test]
    fn test_load_kebab_case_file() -> Result<(), ConfigError> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "verbose = true\ncrate-name = \"my_app\"\nsource-dirs = [\"src\", \"gen\"]\ngenerate-registry = false\n",
        )?;

        let config = Config::load_from_path(&path)?;
        assert_eq!(config.verbose, Some(true));
        assert_eq!(config.crate_name.as_deref(), Some("my_app"));
        assert_eq!(config.source_dirs(), vec!["src".to_string(), "gen".to_string()]);
        assert!(!config.generate_registry());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_default() -> Result<(), ConfigError> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from_path(&temp_dir.path().join(CONFIG_FILE_NAME))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_set_get_and_save() -> Result<(), ConfigError> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        config.set("crate-name", "my-app")?;
        config.set("source-dirs", "src, generated")?;
        config.set("verbose", "true")?;
        config.save_to_path(&path)?;

        let loaded = Config::load_from_path(&path)?;
        assert_eq!(loaded.get("crate-name").as_deref(), Some("my_app"));
        assert_eq!(loaded.get("source-dirs").as_deref(), Some("src,generated"));
        assert_eq!(loaded.values_iter().len(), 3);
        Ok(())
    }

    #[test]
    fn test_set_rejects_unknown_keys_and_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("cache-path", "/tmp"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set("verbose", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("source-dirs", " , "),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_verbosity_from_env() {
        assert_eq!(verbosity_from_env(None), None);
        assert_eq!(verbosity_from_env(Some("true")), Some(1));
        assert_eq!(verbosity_from_env(Some("0")), Some(0));
        assert_eq!(verbosity_from_env(Some("2")), Some(2));
        assert_eq!(verbosity_from_env(Some("loud")), None);
    }
}
