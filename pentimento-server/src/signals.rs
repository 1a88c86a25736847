//! OS signals as queued triggers
//!
//! The listener task only translates signals into [`Trigger`]s on a bounded
//! channel; the scheduler acts on them.

use pentimento_utils::Result;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why the daemon is stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// Empty line or end of stdin
    EndOfInput,
}

/// Work requested from the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Shutdown(ShutdownCause),
    /// SIGUSR1: the visible client set may have changed
    Reconcile,
    /// SIGWINCH: terminal geometry changed
    ResetTerminalInfo,
}

/// Forward SIGINT, SIGTERM, SIGUSR1 and SIGWINCH until cancelled
pub async fn listen(triggers: mpsc::Sender<Trigger>, cancel: CancellationToken) -> Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut user1 = signal(SignalKind::user_defined1())?;
    let mut winch = signal(SignalKind::window_change())?;

    loop {
        let trigger = tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = interrupt.recv() => Trigger::Shutdown(ShutdownCause::Interrupt),
            _ = terminate.recv() => Trigger::Shutdown(ShutdownCause::Terminate),
            _ = user1.recv() => Trigger::Reconcile,
            _ = winch.recv() => Trigger::ResetTerminalInfo,
        };

        debug!(?trigger, "Signal received");
        if triggers.send(trigger).await.is_err() {
            return Ok(());
        }
    }
}
