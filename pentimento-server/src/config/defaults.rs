//! Default configuration values
//!
//! These are embedded in the binary and used when no config file exists.

/// Default configuration as TOML (for reference/documentation)
#[allow(dead_code)]
pub const DEFAULT_CONFIG_TOML: &str = r##"
# pentimento configuration

[daemon]
# Blocking pool size; one worker is taken by stdin
worker_threads = 2
# json, simple or bash
parser = "json"
# synchronous or thread
loader = "thread"
trigger_queue = 16

[tmux]
binary = "tmux"
hook_events = [
    "client-session-changed",
    "session-window-changed",
    "pane-mode-changed",
    "client-detached",
]

[logging]
filter = "info"
# file, stderr or both
output = "file"
"##;
