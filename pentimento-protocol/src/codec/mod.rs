//! Line codecs
//!
//! A codec turns one line of text into [`Fields`] and renders [`Fields`]
//! back into one line. The daemon picks exactly one codec at startup and
//! uses it for both directions.

mod bash;
mod json;
mod simple;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fields::Fields;

pub use bash::BashCodec;
pub use json::JsonCodec;
pub use simple::SimpleCodec;

/// Errors produced while turning a line into an action
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed {codec} input: {message}")]
    Malformed {
        codec: &'static str,
        message: String,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid value for {field}: {value:?} (expected {expected})")]
    InvalidField {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("unknown codec: {0}")]
    UnknownCodec(String),

    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

impl CodecError {
    pub(crate) fn malformed(codec: &'static str, message: impl fmt::Display) -> Self {
        Self::Malformed {
            codec,
            message: message.to_string(),
        }
    }
}

/// Bidirectional line format
pub trait Codec: Send + Sync + fmt::Debug {
    /// Name used on the command line and in the config file
    fn name(&self) -> &'static str;

    /// Parse one line (without its terminator)
    fn parse(&self, line: &str) -> Result<Fields, CodecError>;

    /// Render fields as one line (without a terminator)
    fn unparse(&self, fields: &Fields) -> String;
}

/// Codec selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    #[default]
    Json,
    Simple,
    Bash,
}

impl CodecKind {
    pub const ALL: [CodecKind; 3] = [CodecKind::Json, CodecKind::Simple, CodecKind::Bash];

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecKind::Json => "json",
            CodecKind::Simple => "simple",
            CodecKind::Bash => "bash",
        }
    }

    /// Instantiate the selected codec
    pub fn build(self) -> Arc<dyn Codec> {
        match self {
            CodecKind::Json => Arc::new(JsonCodec),
            CodecKind::Simple => Arc::new(SimpleCodec),
            CodecKind::Bash => Arc::new(BashCodec),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CodecKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CodecError::UnknownCodec(s.to_string()))
    }
}
