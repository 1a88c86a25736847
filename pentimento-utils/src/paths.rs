//! Path utilities for pentimento
//!
//! Handles XDG Base Directory specification compliance for config,
//! state and cache directories.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Application identifier for XDG directories
const APP_NAME: &str = "pentimento";

/// Get project directories
fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/pentimento` or `~/.config/pentimento`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(fallback_config_dir)
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/pentimento/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/pentimento` or `~/.local/state/pentimento`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(fallback_state_dir)
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/pentimento/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

/// Get the cache directory
///
/// Location: `$XDG_CACHE_HOME/pentimento` or `~/.cache/pentimento`
///
/// `XDG_CACHE_HOME` is read on every call so that every daemon sharing a
/// tmux session agrees on where the hook lock files live.
pub fn cache_dir() -> PathBuf {
    match std::env::var_os("XDG_CACHE_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(APP_NAME),
        _ => fallback_cache_dir(),
    }
}

/// Get the lock file tracking the daemons of one tmux session
///
/// Location: `$XDG_CACHE_HOME/pentimento/{session_id}`
pub fn hook_lock_file(session_id: &str) -> PathBuf {
    // tmux session ids look like "$3"; keep them as plain file names
    let name: String = session_id
        .chars()
        .map(|c| if c == '/' { '_' } else { c })
        .collect();
    cache_dir().join(name)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

// Fallback implementations when ProjectDirs is unavailable

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

fn fallback_config_dir() -> PathBuf {
    home_dir().join(".config").join(APP_NAME)
}

fn fallback_state_dir() -> PathBuf {
    home_dir().join(".local").join("state").join(APP_NAME)
}

fn fallback_cache_dir() -> PathBuf {
    home_dir().join(".cache").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // ==================== Config Dir Tests ====================

    #[test]
    fn test_config_dir() {
        let path = config_dir();
        assert!(path.to_string_lossy().contains("pentimento"));
    }

    #[test]
    fn test_config_file_name() {
        let path = config_file();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "config.toml");
        assert!(path.starts_with(config_dir()));
    }

    // ==================== Log Dir Tests ====================

    #[test]
    fn test_log_dir_is_in_state_dir() {
        assert!(log_dir().starts_with(state_dir()));
        assert!(log_dir().ends_with("log"));
    }

    // ==================== Cache Dir Tests ====================

    #[test]
    fn test_cache_dir_with_xdg_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("XDG_CACHE_HOME").ok();

        env::set_var("XDG_CACHE_HOME", "/var/cache/user");
        assert_eq!(cache_dir(), PathBuf::from("/var/cache/user/pentimento"));

        match original {
            Some(val) => env::set_var("XDG_CACHE_HOME", val),
            None => env::remove_var("XDG_CACHE_HOME"),
        }
    }

    #[test]
    fn test_cache_dir_fallback() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("XDG_CACHE_HOME").ok();

        env::remove_var("XDG_CACHE_HOME");
        let path = cache_dir();
        assert!(path.ends_with(".cache/pentimento"), "{:?}", path);

        if let Some(val) = original {
            env::set_var("XDG_CACHE_HOME", val);
        }
    }

    #[test]
    fn test_cache_dir_ignores_empty_xdg() {
        let _guard = ENV_LOCK.lock().unwrap();
        let original = env::var("XDG_CACHE_HOME").ok();

        env::set_var("XDG_CACHE_HOME", "");
        assert!(cache_dir().ends_with(".cache/pentimento"));

        match original {
            Some(val) => env::set_var("XDG_CACHE_HOME", val),
            None => env::remove_var("XDG_CACHE_HOME"),
        }
    }

    // ==================== Hook Lock File Tests ====================

    #[test]
    fn test_hook_lock_file_named_after_session() {
        let _guard = ENV_LOCK.lock().unwrap();
        let path = hook_lock_file("$3");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "$3");
        assert!(path.starts_with(cache_dir()));
    }

    #[test]
    fn test_hook_lock_file_sanitizes_separators() {
        let _guard = ENV_LOCK.lock().unwrap();
        let path = hook_lock_file("../etc");
        assert_eq!(path.parent().unwrap(), cache_dir());
    }

    // ==================== Ensure Dir Tests ====================

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");

        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());

        // Idempotent
        ensure_dir(&nested).unwrap();
    }
}
