//! Logging infrastructure for pentimento
//!
//! Provides unified logging setup using the tracing ecosystem. The daemon
//! never logs to stderr by default: stderr carries the structured error
//! records of the command protocol.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{paths, PentimentoError, Result};

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "PENTIMENTO_LOG";

/// Daemon log file inside the log directory
const LOG_FILE_NAME: &str = "pentimento.log";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr (for one-shot commands)
    Stderr,
    /// Log to file (for the daemon)
    File,
    /// Log to both stderr and file
    Both,
}

impl FromStr for LogOutput {
    type Err = PentimentoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            "both" => Ok(Self::Both),
            other => Err(PentimentoError::config(format!(
                "unknown log output '{}' (expected stderr, file or both)",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "debug", "pentimento=debug,tokio=warn")
    pub filter: String,
    /// Include file/line in logs
    pub file_line: bool,
}

impl LogConfig {
    /// Create config for the layer daemon with a configured default filter
    ///
    /// `PENTIMENTO_LOG` still takes precedence over `default_filter`.
    pub fn daemon_with_default(default_filter: &str) -> Self {
        Self {
            output: LogOutput::File,
            filter: filter_from_env(default_filter),
            file_line: true,
        }
    }

    /// Create config for one-shot commands such as `query_windows`
    pub fn cli() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: filter_from_env("warn"),
            file_line: false,
        }
    }
}

fn filter_from_env(default_filter: &str) -> String {
    std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| default_filter.into())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| PentimentoError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    match config.output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| PentimentoError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::File => {
            let file = std::sync::Mutex::new(open_log_file()?);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(file).with_ansi(false))
                .try_init()
                .map_err(|e| PentimentoError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::Both => {
            let file = std::sync::Mutex::new(open_log_file()?);

            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .with(file_layer)
                .try_init()
                .map_err(|e| PentimentoError::internal(format!("Failed to init logging: {}", e)))?;
        }
    }

    Ok(())
}

fn open_log_file() -> Result<std::fs::File> {
    let log_dir = paths::log_dir();
    std::fs::create_dir_all(&log_dir).map_err(|e| PentimentoError::FileWrite {
        path: log_dir.clone(),
        source: e,
    })?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| PentimentoError::FileWrite {
            path: log_path,
            source: e,
        })
}
