//! Error types for pentimento
//!
//! Provides a unified error type used across all pentimento crates.
//! Every error carries a kind name so it can be reported back to the
//! controlling process as a structured record.

use std::path::PathBuf;

/// Main error type for pentimento operations
#[derive(Debug, thiserror::Error)]
pub enum PentimentoError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Command Errors ===

    #[error("Failed to decode command: {0}")]
    Decode(String),

    // === Resource Errors ===

    #[error("Failed to load image {path}: {message}")]
    ImageLoad { path: PathBuf, message: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Image loader is closed")]
    LoaderClosed,

    #[error("Draw failed for window {window_id}: {message}")]
    Draw { window_id: u64, message: String },

    // === Display Errors ===

    #[error("Display connection lost: {0}")]
    ConnectionLost(String),

    // === Multiplexer Errors ===

    #[error("tmux error: {0}")]
    Multiplexer(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PentimentoError {
    /// Create a decode error
    pub fn decode(msg: impl std::fmt::Display) -> Self {
        Self::Decode(msg.to_string())
    }

    /// Create an invalid geometry error
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Create a connection-lost error
    pub fn connection_lost(msg: impl Into<String>) -> Self {
        Self::ConnectionLost(msg.into())
    }

    /// Create a multiplexer error
    pub fn multiplexer(msg: impl Into<String>) -> Self {
        Self::Multiplexer(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Name of the failing condition, as written into error records
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DecodeError",
            Self::Io(_)
            | Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::ImageLoad { .. }
            | Self::InvalidGeometry(_)
            | Self::LoaderClosed
            | Self::Draw { .. } => "ResourceError",
            Self::ConnectionLost(_) => "ProtocolConnectionError",
            Self::Multiplexer(_) => "MultiplexerError",
            Self::Config(_) | Self::ConfigInvalid { .. } => "ConfigError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// Whether the error ends the process
    ///
    /// Only a lost display connection is fatal: without it no window
    /// operation is meaningful anymore.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionLost(_))
    }
}

/// Result type alias using PentimentoError
pub type Result<T> = std::result::Result<T, PentimentoError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Display Tests ====================

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = PentimentoError::Io(io_err);
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = PentimentoError::FileRead {
            path: PathBuf::from("/root/.cache/pentimento/$1"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/root/.cache/pentimento/$1"));
    }

    #[test]
    fn test_error_display_decode() {
        let err = PentimentoError::decode("unknown action: resize");
        assert_eq!(
            err.to_string(),
            "Failed to decode command: unknown action: resize"
        );
    }

    #[test]
    fn test_error_display_image_load() {
        let err = PentimentoError::ImageLoad {
            path: PathBuf::from("/tmp/cover.png"),
            message: "unsupported format".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/cover.png"));
        assert!(msg.contains("unsupported format"));
    }

    #[test]
    fn test_error_display_draw() {
        let err = PentimentoError::Draw {
            window_id: 7,
            message: "surface gone".into(),
        };
        assert_eq!(err.to_string(), "Draw failed for window 7: surface gone");
    }

    #[test]
    fn test_error_display_connection_lost() {
        let err = PentimentoError::connection_lost("broken pipe");
        assert_eq!(err.to_string(), "Display connection lost: broken pipe");
    }

    #[test]
    fn test_error_display_config_invalid() {
        let err = PentimentoError::ConfigInvalid {
            path: PathBuf::from("/home/user/.config/pentimento/config.toml"),
            message: "syntax error".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid configuration"));
        assert!(msg.contains("config.toml"));
        assert!(msg.contains("syntax error"));
    }

    // ==================== Kind Tests ====================

    #[test]
    fn test_kind_decode() {
        assert_eq!(PentimentoError::decode("bad").kind(), "DecodeError");
    }

    #[test]
    fn test_kind_resource_errors() {
        let resource = [
            PentimentoError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")),
            PentimentoError::ImageLoad {
                path: PathBuf::from("/x"),
                message: "x".into(),
            },
            PentimentoError::geometry("negative width"),
            PentimentoError::LoaderClosed,
            PentimentoError::Draw {
                window_id: 1,
                message: "x".into(),
            },
        ];

        for err in resource {
            assert_eq!(err.kind(), "ResourceError", "{:?}", err);
        }
    }

    #[test]
    fn test_kind_connection() {
        assert_eq!(
            PentimentoError::connection_lost("eof").kind(),
            "ProtocolConnectionError"
        );
    }

    #[test]
    fn test_kind_other() {
        assert_eq!(PentimentoError::multiplexer("x").kind(), "MultiplexerError");
        assert_eq!(PentimentoError::config("x").kind(), "ConfigError");
        assert_eq!(PentimentoError::internal("x").kind(), "InternalError");
    }

    // ==================== Fatal Tests ====================

    #[test]
    fn test_only_connection_loss_is_fatal() {
        assert!(PentimentoError::connection_lost("eof").is_fatal());

        let non_fatal = [
            PentimentoError::decode("x"),
            PentimentoError::geometry("x"),
            PentimentoError::LoaderClosed,
            PentimentoError::multiplexer("x"),
            PentimentoError::config("x"),
            PentimentoError::internal("x"),
        ];

        for err in non_fatal {
            assert!(!err.is_fatal(), "Expected {:?} to NOT be fatal", err);
        }
    }

    // ==================== From Trait Tests ====================

    #[test]
    fn test_from_io_error_preserves_kind() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: PentimentoError = io_err.into();
        if let PentimentoError::Io(inner) = err {
            assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied);
        } else {
            panic!("Expected Io variant");
        }
    }
}
