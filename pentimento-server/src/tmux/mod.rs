//! Terminal multiplexer collaborator
//!
//! Inside tmux the images belong to one pane: the pane's position inside the
//! terminal becomes the view offset, and only clients currently showing the
//! pane get a window.

pub mod hooks;

use std::fmt;
use std::process::Command;

use pentimento_utils::{PentimentoError, Result};
use tracing::{debug, trace};

use crate::config::TmuxConfig;
use crate::state::Offset;

pub use hooks::HookRegistration;

/// Session, pane and client queries plus hook management
pub trait Multiplexer: Send + Sync + fmt::Debug {
    /// Whether the daemon runs inside the multiplexer
    fn is_used(&self) -> bool;

    /// Identifier of the session the pane belongs to
    fn session_id(&self) -> Result<String>;

    /// Position of the pane inside the terminal
    fn pane_offset(&self) -> Result<Offset>;

    /// Processes whose terminal currently shows the pane
    fn client_pids(&self) -> Result<Vec<u32>>;

    /// Make the session notify `pids` when pane visibility may have changed
    fn register_hooks(&self, pids: &[u32]) -> Result<()>;

    fn unregister_hooks(&self) -> Result<()>;
}

/// tmux, driven through its command line client
#[derive(Debug, Clone)]
pub struct Tmux {
    binary: String,
    pane: String,
    hook_events: Vec<String>,
    /// Program run by the hooks (this executable)
    notifier: String,
}

impl Tmux {
    /// Detect tmux from `TMUX` and `TMUX_PANE`
    pub fn from_env(config: &TmuxConfig) -> Option<Self> {
        std::env::var_os("TMUX")?;
        let pane = std::env::var("TMUX_PANE").ok()?;

        let notifier = std::env::current_exe()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "pentimento".to_string());

        Some(Self::new(config, pane, notifier))
    }

    pub fn new(config: &TmuxConfig, pane: impl Into<String>, notifier: impl Into<String>) -> Self {
        Self {
            binary: config.binary.clone(),
            pane: pane.into(),
            hook_events: config.hook_events.clone(),
            notifier: notifier.into(),
        }
    }

    /// Shell command the hooks run for `pids`
    pub fn hook_command(&self, pids: &[u32]) -> String {
        let pids: Vec<String> = pids.iter().map(u32::to_string).collect();
        format!("run-shell \"{} query_windows {}\"", self.notifier, pids.join(" "))
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        trace!(binary = %self.binary, ?args, "Running tmux");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| PentimentoError::multiplexer(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(PentimentoError::multiplexer(format!(
                "{} {} failed: {}",
                self.binary,
                args.first().unwrap_or(&""),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn display(&self, format: &str) -> Result<String> {
        self.run(&["display", "-p", "-F", format, "-t", &self.pane])
    }
}

impl Multiplexer for Tmux {
    fn is_used(&self) -> bool {
        true
    }

    fn session_id(&self) -> Result<String> {
        self.display("#{session_id}")
    }

    fn pane_offset(&self) -> Result<Offset> {
        parse_offset(&self.display("#{pane_top},#{pane_left},#{pane_bottom},#{pane_right}")?)
    }

    fn client_pids(&self) -> Result<Vec<u32>> {
        // Hidden panes and panes in copy mode get no windows
        if self.display("#{window_active},#{pane_in_mode}")? != "1,0" {
            return Ok(Vec::new());
        }

        let pids = parse_pids(&self.run(&["list-clients", "-F", "#{client_pid}", "-t", &self.pane])?)?;
        debug!(?pids, "tmux clients");
        Ok(pids)
    }

    fn register_hooks(&self, pids: &[u32]) -> Result<()> {
        let command = self.hook_command(pids);
        for event in &self.hook_events {
            self.run(&["set-hook", "-t", &self.pane, event, &command])?;
        }
        Ok(())
    }

    fn unregister_hooks(&self) -> Result<()> {
        for event in &self.hook_events {
            self.run(&["set-hook", "-u", "-t", &self.pane, event])?;
        }
        Ok(())
    }
}

/// Stand-in used outside a multiplexer
///
/// The only client is the daemon itself and the pane is the whole terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMultiplexer;

impl Multiplexer for NoMultiplexer {
    fn is_used(&self) -> bool {
        false
    }

    fn session_id(&self) -> Result<String> {
        Err(PentimentoError::multiplexer("not running inside tmux"))
    }

    fn pane_offset(&self) -> Result<Offset> {
        Ok(Offset::default())
    }

    fn client_pids(&self) -> Result<Vec<u32>> {
        Ok(vec![std::process::id()])
    }

    fn register_hooks(&self, _pids: &[u32]) -> Result<()> {
        Ok(())
    }

    fn unregister_hooks(&self) -> Result<()> {
        Ok(())
    }
}

fn parse_offset(text: &str) -> Result<Offset> {
    let values = text
        .trim()
        .split(',')
        .map(|v| v.trim().parse::<i32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| PentimentoError::multiplexer(format!("bad pane geometry {:?}: {}", text, e)))?;

    match values.as_slice() {
        &[top, left, bottom, right] => Ok(Offset::new(top, left, bottom, right)),
        _ => Err(PentimentoError::multiplexer(format!(
            "bad pane geometry {:?}: expected four values",
            text
        ))),
    }
}

fn parse_pids(text: &str) -> Result<Vec<u32>> {
    text.split_whitespace()
        .map(|pid| {
            pid.parse::<u32>()
                .map_err(|e| PentimentoError::multiplexer(format!("bad client pid {:?}: {}", pid, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("1,40,22,79\n").unwrap(), Offset::new(1, 40, 22, 79));
        assert!(parse_offset("1,2,3").is_err());
        assert!(parse_offset("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_pids() {
        assert_eq!(parse_pids("123\n456\n").unwrap(), vec![123, 456]);
        assert!(parse_pids("").unwrap().is_empty());
        let err = parse_pids("12\nx").unwrap_err();
        assert_eq!(err.kind(), "MultiplexerError");
    }

    #[test]
    fn test_hook_command() {
        let tmux = Tmux::new(&TmuxConfig::default(), "%3", "/usr/bin/pentimento");
        assert_eq!(
            tmux.hook_command(&[10, 20]),
            "run-shell \"/usr/bin/pentimento query_windows 10 20\""
        );
    }

    #[test]
    fn test_missing_binary_is_multiplexer_error() {
        let config = TmuxConfig {
            binary: "/nonexistent/tmux".into(),
            ..TmuxConfig::default()
        };
        let tmux = Tmux::new(&config, "%0", "pentimento");

        let err = tmux.session_id().unwrap_err();
        assert_eq!(err.kind(), "MultiplexerError");
    }

    #[test]
    fn test_no_multiplexer() {
        let mux = NoMultiplexer;
        assert!(!mux.is_used());
        assert_eq!(mux.client_pids().unwrap(), vec![std::process::id()]);
        assert!(mux.pane_offset().unwrap().is_zero());
        assert!(mux.session_id().is_err());
    }
}
