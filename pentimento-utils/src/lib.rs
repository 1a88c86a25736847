//! pentimento-utils: Common utilities shared across pentimento crates
//!
//! This crate provides:
//! - Unified error types ([`PentimentoError`], [`Result`])
//! - Logging infrastructure ([`init_logging_with_config`], [`LogConfig`])
//! - XDG-compliant path utilities ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

// Re-export main types at crate root for convenience
pub use error::{PentimentoError, Result};
pub use logging::{init_logging_with_config, LogConfig, LogOutput, LOG_ENV_VAR};

// Re-export commonly used path functions
pub use paths::{cache_dir, config_dir, config_file, hook_lock_file, log_dir, state_dir};
