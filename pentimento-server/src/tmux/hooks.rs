//! tmux hook bookkeeping
//!
//! All daemons of one tmux session share a single set of hooks. The lock file
//! `$XDG_CACHE_HOME/pentimento/<session_id>` lists the pids the hooks notify;
//! every change to it happens under an exclusive `flock`, and the hooks are
//! rewritten for the new pid set while the lock is held.

use std::collections::BTreeSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use pentimento_utils::paths::ensure_dir;
use pentimento_utils::{hook_lock_file, PentimentoError, Result};
use tracing::{info, warn};

use super::Multiplexer;

/// Membership of this process in its session's hook set
///
/// Dropping the registration removes the pid again.
#[derive(Debug)]
pub struct HookRegistration {
    multiplexer: Arc<dyn Multiplexer>,
    lock_path: PathBuf,
    pid: u32,
    active: bool,
}

impl HookRegistration {
    /// Add this process to the hook set of the current session
    pub fn register(multiplexer: Arc<dyn Multiplexer>) -> Result<Self> {
        let session_id = multiplexer.session_id()?;
        let lock_path = hook_lock_file(&session_id);
        Self::register_at(multiplexer, lock_path, std::process::id())
    }

    /// Add `pid` to the hook set tracked in `lock_path`
    pub fn register_at(
        multiplexer: Arc<dyn Multiplexer>,
        lock_path: PathBuf,
        pid: u32,
    ) -> Result<Self> {
        let pids = update_hooks(&lock_path, multiplexer.as_ref(), |pids| {
            pids.insert(pid);
        })?;
        info!(pid, pids = ?pids, lock_file = %lock_path.display(), "tmux hooks registered");

        Ok(Self {
            multiplexer,
            lock_path,
            pid,
            active: true,
        })
    }

    /// Remove this process from the hook set
    ///
    /// Unregisters the hooks when no pid remains. Safe to call repeatedly.
    pub fn release(&mut self) -> Result<()> {
        if !std::mem::replace(&mut self.active, false) {
            return Ok(());
        }

        let pid = self.pid;
        let pids = update_hooks(&self.lock_path, self.multiplexer.as_ref(), |pids| {
            pids.remove(&pid);
        })?;
        info!(pid, remaining = pids.len(), "tmux hooks released");
        Ok(())
    }
}

impl Drop for HookRegistration {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to release tmux hooks");
        }
    }
}

/// Read-modify-write the pid set and re-register the hooks, under the lock
///
/// When the multiplexer rejects the new set, only removals are written back:
/// a pid the hooks never learned about must not linger in the file.
fn update_hooks(
    lock_path: &Path,
    multiplexer: &dyn Multiplexer,
    change: impl FnOnce(&mut BTreeSet<u32>),
) -> Result<BTreeSet<u32>> {
    if let Some(dir) = lock_path.parent() {
        ensure_dir(dir).map_err(|e| PentimentoError::FileWrite {
            path: dir.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| write_error(lock_path, e))?;

    // Released when `file` is dropped
    file.lock_exclusive().map_err(|e| write_error(lock_path, e))?;

    let previous = read_pids(&mut file).map_err(|e| PentimentoError::FileRead {
        path: lock_path.to_path_buf(),
        source: e,
    })?;
    let mut pids = previous.clone();
    change(&mut pids);

    let registered = if pids.is_empty() {
        multiplexer.unregister_hooks()
    } else {
        let list: Vec<u32> = pids.iter().copied().collect();
        multiplexer.register_hooks(&list)
    };

    let written = match &registered {
        Ok(()) => pids.clone(),
        Err(e) => {
            warn!(error = %e, "Hook update rejected; keeping only removals");
            previous.intersection(&pids).copied().collect()
        }
    };
    write_pids(&mut file, &written).map_err(|e| write_error(lock_path, e))?;

    registered.map(|()| pids)
}

fn read_pids(file: &mut File) -> std::io::Result<BTreeSet<u32>> {
    let mut content = String::new();
    file.seek(SeekFrom::Start(0))?;
    file.read_to_string(&mut content)?;

    Ok(content
        .split_whitespace()
        .filter_map(|pid| match pid.parse() {
            Ok(pid) => Some(pid),
            Err(_) => {
                warn!(entry = pid, "Ignoring malformed pid in lock file");
                None
            }
        })
        .collect())
}

fn write_pids(file: &mut File, pids: &BTreeSet<u32>) -> std::io::Result<()> {
    let content: Vec<String> = pids.iter().map(u32::to_string).collect();
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(content.join(" ").as_bytes())?;
    file.flush()
}

fn write_error(path: &Path, source: std::io::Error) -> PentimentoError {
    PentimentoError::FileWrite {
        path: path.to_path_buf(),
        source,
    }
}
