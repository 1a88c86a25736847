//! Configuration schema structs

use pentimento_protocol::CodecKind;
use serde::{Deserialize, Serialize};

use crate::loader::LoaderKind;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub daemon: DaemonConfig,
    pub tmux: TmuxConfig,
    pub logging: LoggingConfig,
}

/// Runtime and protocol settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Blocking pool size; stdin reads keep one worker busy
    pub worker_threads: usize,
    /// Command encoding
    pub parser: CodecKind,
    /// Image loader
    pub loader: LoaderKind,
    /// Capacity of the signal trigger queue
    pub trigger_queue: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            parser: CodecKind::Json,
            loader: LoaderKind::Thread,
            trigger_queue: 16,
        }
    }
}

/// tmux integration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TmuxConfig {
    /// tmux executable
    pub binary: String,
    /// Hooks that make tmux notify the daemons of this session
    pub hook_events: Vec<String>,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: "tmux".into(),
            hook_events: vec![
                "client-session-changed".into(),
                "session-window-changed".into(),
                "pane-mode-changed".into(),
                "client-detached".into(),
            ],
        }
    }
}

/// Log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `PENTIMENTO_LOG` takes precedence
    pub filter: String,
    /// `file`, `stderr` or `both`
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            output: "file".into(),
        }
    }
}
