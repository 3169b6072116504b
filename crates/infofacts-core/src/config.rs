//! infofacts Configuration Management
//!
//! Handles run configuration from environment variables, config files,
//! and command-line arguments with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Input dump
    pub input: InputConfig,

    /// Extraction schema location
    pub schema: SchemaConfig,

    /// Output datasets
    pub output: OutputConfig,

    /// Extraction tuning
    pub extraction: ExtractionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("INFOFACTS_INPUT") {
            config.input.dump_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("INFOFACTS_SCHEMA") {
            config.schema.path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("INFOFACTS_OUTPUT_DIR") {
            config.output.directory = PathBuf::from(dir);
        }
        if let Ok(len) = std::env::var("INFOFACTS_MAX_VALUE_LEN") {
            config.extraction.max_value_len =
                len.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "INFOFACTS_MAX_VALUE_LEN".to_string(),
                    value: len,
                })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError { path, message },
            other => other,
        })
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.input.dump_path.is_some() {
            self.input.dump_path = env_config.input.dump_path;
        }
        if env_config.schema.path != defaults.schema.path {
            self.schema.path = env_config.schema.path;
        }
        if env_config.output.directory != defaults.output.directory {
            self.output.directory = env_config.output.directory;
        }
        if env_config.extraction.max_value_len != defaults.extraction.max_value_len {
            self.extraction.max_value_len = env_config.extraction.max_value_len;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }

        self.validate()?;
        Ok(self)
    }

    /// The configured input dump; required for extraction runs
    pub fn dump_path(&self) -> Result<&Path, ConfigError> {
        self.input
            .dump_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingRequired("input.dump_path".to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.max_value_len == 0 {
            return Err(ConfigError::InvalidValue {
                key: "extraction.max_value_len".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Input dump configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InputConfig {
    /// Path to the article dump (XML export)
    pub dump_path: Option<PathBuf>,
}

/// Extraction schema location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// TOML file with patterns, combinations, and ontology tables
    pub path: PathBuf,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("schema.toml"),
        }
    }
}

/// Output dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one TSV file per dataset
    pub directory: PathBuf,

    /// File extension of dataset files
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
            extension: "tsv".to_string(),
        }
    }
}

/// Extraction tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Longest attribute value (in characters) before the environment is
    /// treated as unterminated
    pub max_value_len: usize,

    /// Log progress every N pages (0 disables)
    pub progress_every: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_value_len: 20_000,
            progress_every: 100_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
