//! Entry points of the two subcommands

use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::sync::Arc;

use pentimento_utils::{init_logging_with_config, LogConfig, PentimentoError, Result};
use tracing::{info, warn};

use crate::cli::LayerArgs;
use crate::config::{AppConfig, ConfigLoader};
use crate::reporter::ErrorReporter;
use crate::scheduler::{Collaborators, Scheduler, SchedulerOptions};
use crate::tmux::{Multiplexer, NoMultiplexer, Tmux};
use crate::windows::HeadlessDisplay;

/// Screen size reported by the headless display
const HEADLESS_SCREEN: (u32, u32) = (1920, 1080);

/// `pentimento layer`: serve commands from stdin until told to stop
pub fn run_layer(args: LayerArgs) -> Result<()> {
    let mut config = ConfigLoader::load_and_validate(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    let mut log_config = LogConfig::daemon_with_default(&config.logging.filter);
    log_config.output = config.logging.output.parse()?;
    init_logging_with_config(log_config)?;

    if args.silent {
        silence_stderr()?;
    }

    info!(
        parser = %config.daemon.parser,
        loader = %config.daemon.loader,
        worker_threads = config.daemon.worker_threads,
        "Starting layer daemon"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(config.daemon.worker_threads)
        .build()?;

    let multiplexer: Arc<dyn Multiplexer> = match Tmux::from_env(&config.tmux) {
        Some(tmux) => Arc::new(tmux),
        None => Arc::new(NoMultiplexer),
    };
    let codec = config.daemon.parser.build();
    let collab = Collaborators {
        display: Arc::new(HeadlessDisplay::new(HEADLESS_SCREEN.0, HEADLESS_SCREEN.1)),
        multiplexer,
        loader: config.daemon.loader.build(),
        reporter: ErrorReporter::stderr(codec.clone()),
        codec,
    };
    let options = SchedulerOptions {
        trigger_queue: config.daemon.trigger_queue,
        listen_signals: true,
    };

    let result = runtime.block_on(Scheduler::new(collab, options).run(tokio::io::stdin()));
    // A stdin read may still be parked on the blocking pool
    runtime.shutdown_background();

    let reason = result?;
    info!(?reason, "Layer daemon exited");
    Ok(())
}

/// `pentimento query_windows PID...`: ask each daemon to reconcile
pub fn query_windows(pids: &[u32]) -> Result<()> {
    init_logging_with_config(LogConfig::cli())?;

    for &pid in pids {
        let Ok(raw) = libc::pid_t::try_from(pid) else {
            warn!(pid, "Pid out of range");
            continue;
        };
        // SAFETY: kill(2) takes plain integers
        if unsafe { libc::kill(raw, libc::SIGUSR1) } != 0 {
            warn!(pid, error = %std::io::Error::last_os_error(), "Failed to notify daemon");
        }
    }
    Ok(())
}

/// CLI flags take precedence over the config file
fn apply_overrides(config: &mut AppConfig, args: &LayerArgs) {
    if let Some(parser) = args.parser {
        config.daemon.parser = parser;
    }
    if let Some(loader) = args.loader {
        config.daemon.loader = loader;
    }
}

fn silence_stderr() -> Result<()> {
    let devnull = OpenOptions::new().write(true).open("/dev/null")?;
    // SAFETY: both descriptors are open for the duration of the call
    if unsafe { libc::dup2(devnull.as_raw_fd(), libc::STDERR_FILENO) } < 0 {
        return Err(PentimentoError::Io(std::io::Error::last_os_error()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LoaderKind;
    use pentimento_protocol::CodecKind;

    #[test]
    fn test_cli_overrides_config() {
        let mut config = AppConfig::default();
        let args = LayerArgs {
            parser: Some(CodecKind::Bash),
            loader: Some(LoaderKind::Synchronous),
            ..Default::default()
        };

        apply_overrides(&mut config, &args);
        assert_eq!(config.daemon.parser, CodecKind::Bash);
        assert_eq!(config.daemon.loader, LoaderKind::Synchronous);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config = AppConfig::default();
        config.daemon.parser = CodecKind::Simple;

        apply_overrides(&mut config, &LayerArgs::default());
        assert_eq!(config.daemon.parser, CodecKind::Simple);
        assert_eq!(config.daemon.loader, LoaderKind::Thread);
    }
}
