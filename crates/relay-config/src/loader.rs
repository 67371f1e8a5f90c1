//! Configuration loading from files and inline sources.
//!
//! Supports YAML, TOML, and JSON with `${ENV_VAR}` substitution applied to
//! file contents before parsing. Later sources take precedence over earlier
//! ones; the merged result is validated once at the end.

use crate::schema::RelayConfig;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};
use validator::Validate;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// IO error
    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Configuration validation error: {0}")]
    Validation(String),

    /// Unsupported format
    #[error("Unsupported configuration format: {extension}")]
    UnsupportedFormat {
        /// The unsupported file extension
        extension: String,
    },

    /// Environment variable not found during substitution
    #[error("Environment variable not found: {name}")]
    EnvVarNotFound {
        /// The missing variable name
        name: String,
    },
}

/// Configuration source
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// File path (format inferred from extension)
    File(String),
    /// Raw YAML string
    Yaml(String),
    /// Raw TOML string
    Toml(String),
    /// Raw JSON string
    Json(String),
    /// Default configuration
    Default,
}

/// Configuration loader
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    /// Create a new config loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add a configuration source
    #[must_use]
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Add a file source
    #[must_use]
    pub fn with_file(self, path: impl Into<String>) -> Self {
        self.with_source(ConfigSource::File(path.into()))
    }

    /// Load configuration, later sources taking precedence
    ///
    /// # Errors
    /// Returns error if any source fails to load or the result is invalid
    pub async fn load(self) -> Result<RelayConfig, ConfigError> {
        let mut config = RelayConfig::default();

        for source in self.sources {
            config = Self::load_source(&source).await?;
        }

        config
            .validate()
            .map_err(|e| ConfigError::Validation(format!("{e}")))?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Load from a single source
    async fn load_source(source: &ConfigSource) -> Result<RelayConfig, ConfigError> {
        match source {
            ConfigSource::File(path) => Self::load_file(path).await,
            ConfigSource::Yaml(content) => Self::parse_yaml(content),
            ConfigSource::Toml(content) => Self::parse_toml(content),
            ConfigSource::Json(content) => Self::parse_json(content),
            ConfigSource::Default => Ok(RelayConfig::default()),
        }
    }

    /// Load configuration from a file
    async fn load_file(path: &str) -> Result<RelayConfig, ConfigError> {
        let path = Path::new(path);

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let content = Self::substitute_env_vars(&content)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        debug!(path = %path.display(), format = %extension, "Loading configuration file");

        match extension.as_str() {
            "yaml" | "yml" => Self::parse_yaml(&content),
            "toml" => Self::parse_toml(&content),
            "json" => Self::parse_json(&content),
            other => Err(ConfigError::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }

    fn parse_yaml(content: &str) -> Result<RelayConfig, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn parse_toml(content: &str) -> Result<RelayConfig, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    fn parse_json(content: &str) -> Result<RelayConfig, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Substitute `${VAR}` references with environment values.
    ///
    /// Credential entries are exempt: they resolve lazily via
    /// `RelayConfig::resolve_credentials` so a missing key env var does not
    /// fail the whole load.
    fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            let (before, after) = rest.split_at(start);
            result.push_str(before);

            let Some(end) = after.find('}') else {
                result.push_str(after);
                return Ok(result);
            };

            let name = &after[2..end];
            if name.starts_with("RELAY_API_KEY") || name.contains("CRED") {
                // leave credential references for lazy resolution
                result.push_str(&after[..=end]);
            } else {
                let value =
                    std::env::var(name).map_err(|_| ConfigError::EnvVarNotFound {
                        name: name.to_string(),
                    })?;
                result.push_str(&value);
            }
            rest = &after[end + 1..];
        }

        result.push_str(rest);
        Ok(result)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
