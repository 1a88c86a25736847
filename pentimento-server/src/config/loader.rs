//! Configuration loader

use std::path::Path;

use pentimento_utils::{config_file, LogOutput, PentimentoError, Result};

use super::AppConfig;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| PentimentoError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| PentimentoError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        // stdin holds one blocking worker for the lifetime of the daemon
        if config.daemon.worker_threads < 2 || config.daemon.worker_threads > 64 {
            return Err(PentimentoError::config(
                "worker_threads must be between 2 and 64",
            ));
        }

        if config.daemon.trigger_queue == 0 {
            return Err(PentimentoError::config("trigger_queue must be at least 1"));
        }

        if config.tmux.binary.trim().is_empty() {
            return Err(PentimentoError::config("tmux.binary must not be empty"));
        }

        config.logging.output.parse::<LogOutput>()?;

        Ok(())
    }

    /// Load from `path` when given, the default location otherwise
    pub fn load_from(path: Option<&Path>) -> Result<AppConfig> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load and validate
    pub fn load_and_validate(path: Option<&Path>) -> Result<AppConfig> {
        let config = Self::load_from(path)?;
        Self::validate(&config)?;
        Ok(config)
    }
}
