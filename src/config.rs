//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Config file loading (optional)
//! - Environment variable overrides
//! - Runtime defaults
//! - Validation of the component mapping before a mapper is built
//!
//! ```toml
//! [logging]
//! level = "WARN"
//! format = "pretty"
//! output = "console"
//!
//! [parsing]
//! tres_keys = ["cpu", "mem", "node", "gres/gpu"]
//!
//! [components.cpu]
//!
//! [components.node.target_components.gpu_hours]
//! factor = 5.0
//! ```

use crate::mapper::ComponentMapper;
use crate::models::ComponentConfig;
use crate::parser::TresKeys;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

const LOG_FORMATS: [&str; 2] = ["pretty", "json"];
const LOG_OUTPUTS: [&str; 3] = ["console", "file", "both"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report parsing configuration
    #[serde(default)]
    pub parsing: ParsingConfig,

    /// Paths configuration
    #[serde(default)]
    pub paths: PathsConfig,

    /// Source components and their target mappings
    #[serde(default)]
    pub components: BTreeMap<String, ComponentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    pub tres_keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub log_directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "WARN".to_string(),
            format: "pretty".to_string(),
            output: "console".to_string(),
        }
    }
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            tres_keys: TresKeys::default_keys().iter().map(String::from).collect(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            parsing: ParsingConfig::default(),
            paths: PathsConfig::default(),
            components: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("tres-usage.toml"),
            PathBuf::from(".tres-usage.toml"),
            dirs::config_dir()
                .map(|d| d.join("tres-usage").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load an explicit file, then apply environment overrides and validate
    pub fn load_with_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        if let Ok(val) = env::var("TRES_USAGE_KEYS") {
            self.parsing.tres_keys = val
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect();
        }

        if let Ok(val) = env::var("TRES_USAGE_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.parsing.tres_keys.is_empty() {
            return Err(anyhow::anyhow!("At least one TRES key must be configured"));
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log format {:?}, expected one of {:?}",
                self.logging.format,
                LOG_FORMATS
            ));
        }

        if !LOG_OUTPUTS.contains(&self.logging.output.as_str()) {
            return Err(anyhow::anyhow!(
                "Unknown log output {:?}, expected one of {:?}",
                self.logging.output,
                LOG_OUTPUTS
            ));
        }

        for (source, component) in &self.components {
            for (target, target_config) in &component.target_components {
                if target_config.factor == 0.0 {
                    warn!(
                        source = %source,
                        target = %target,
                        "Zero factor configured, reverse usage for this target is discarded"
                    );
                }
            }
        }

        // Factor checks live in the mapper itself
        self.build_mapper()
            .context("Invalid component mapping configuration")?;

        Ok(())
    }

    /// The recognized resource keys
    pub fn tres_keys(&self) -> TresKeys {
        TresKeys::new(self.parsing.tres_keys.iter().cloned())
    }

    /// Build a component mapper from the `[components]` table
    pub fn build_mapper(&self) -> Result<ComponentMapper> {
        Ok(ComponentMapper::from_config(&self.components)?)
    }

    /// Save current configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!(path = %path.display(), "Configuration saved to file");

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance, falling back to defaults if loading fails
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| {
        Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load configuration, using defaults");
            Config::default()
        })
    })
}

/// Install an explicitly loaded configuration. Returns false if one is already set.
pub fn set_config(config: Config) -> bool {
    CONFIG.set(config).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "WARN");
        assert!(config.parsing.tres_keys.contains(&"cpu".to_string()));
        assert!(config.components.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_keys() {
        let mut config = Config::default();
        config.parsing.tres_keys.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_factor() {
        let mut config = Config::default();
        config.components.insert(
            "cpu".to_string(),
            ComponentConfig::passthrough().with_target("credits", -2.0),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tres_keys_from_config() {
        let mut config = Config::default();
        config.parsing.tres_keys = vec!["cpu".to_string(), "mem".to_string()];
        let keys = config.tres_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("mem"));
        assert!(!keys.contains("node"));
    }
}
