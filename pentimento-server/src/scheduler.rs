//! Daemon lifecycle
//!
//! Boots the window set, spawns the reactor, dispatcher and signal listener,
//! then serves queued triggers until one of them asks to stop. Shutdown
//! joins every task once; teardown of windows, loader and tmux hooks happens
//! on every exit path.

use std::sync::Arc;

use pentimento_protocol::Codec;
use pentimento_utils::{PentimentoError, Result};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::commands;
use crate::loader::ImageLoader;
use crate::reactor;
use crate::reconcile;
use crate::reporter::ErrorReporter;
use crate::shutdown::{ShutdownCoordinator, TaskKind, TaskOutcome, Teardown};
use crate::signals::{self, ShutdownCause, Trigger};
use crate::state::{Offset, SharedState, Tools};
use crate::tmux::{HookRegistration, Multiplexer};
use crate::windows::Display;

/// External services the daemon drives
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub display: Arc<dyn Display>,
    pub multiplexer: Arc<dyn Multiplexer>,
    pub loader: Arc<dyn ImageLoader>,
    pub codec: Arc<dyn Codec>,
    pub reporter: ErrorReporter,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    /// Capacity of the trigger queue
    pub trigger_queue: usize,
    /// Install OS signal handlers
    pub listen_signals: bool,
}

/// Why the run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Signal(ShutdownCause),
    EndOfInput,
    /// A task returned on its own without a shutdown request
    TaskEnded(TaskKind),
}

pub struct Scheduler {
    collab: Collaborators,
    options: SchedulerOptions,
    sender: mpsc::Sender<Trigger>,
    receiver: mpsc::Receiver<Trigger>,
}

impl Scheduler {
    pub fn new(collab: Collaborators, options: SchedulerOptions) -> Self {
        let (sender, receiver) = mpsc::channel(options.trigger_queue.max(1));
        Self {
            collab,
            options,
            sender,
            receiver,
        }
    }

    /// Handle for queueing triggers from outside the run
    pub fn triggers(&self) -> mpsc::Sender<Trigger> {
        self.sender.clone()
    }

    /// Run the daemon until a shutdown trigger, end of input or a fatal error
    pub async fn run<R>(self, input: R) -> Result<ExitReason>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let Scheduler {
            collab,
            options,
            sender,
            mut receiver,
        } = self;

        let shared = SharedState::new(collab.display.clone(), collab.multiplexer.clone(), sender);
        let tools = Tools {
            loader: collab.loader.clone(),
            codec: collab.codec.clone(),
            reporter: collab.reporter.clone(),
        };

        let mut teardown = Teardown::new(shared.state.clone(), collab.loader.clone());
        boot(&shared)?;
        let mut hooks = register_hooks(&shared, &tools.reporter);

        let cancel = CancellationToken::new();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        spawn_tasks(&mut tasks, &shared, &tools, input, &cancel, options.listen_signals);

        let outcome = serve(&mut receiver, &mut tasks, &shared, &tools.reporter).await;

        let mut coordinator = ShutdownCoordinator::new(cancel);
        for e in coordinator.shutdown(&mut tasks).await {
            warn!(error = %e, "Task error collected at shutdown");
        }
        teardown.run();
        if let Some(hooks) = hooks.as_mut() {
            if let Err(e) = hooks.release() {
                warn!(error = %e, "Failed to release tmux hooks");
            }
        }

        match &outcome {
            Ok(reason) => info!(?reason, "Daemon stopped"),
            Err(e) => error!(error = %e, "Daemon stopped on fatal error"),
        }
        outcome
    }
}

/// Create the initial windows and fill in the view geometry
fn boot(shared: &SharedState) -> Result<()> {
    let pids = shared.multiplexer.client_pids()?;
    let parents = shared.display.parent_infos(&pids)?;
    let windows = shared.display.create_windows(&parents)?;
    let (screen_width, screen_height) = shared.display.screen_size();
    let offset = if shared.multiplexer.is_used() {
        shared.multiplexer.pane_offset()?
    } else {
        Offset::default()
    };

    let mut state = shared.state.lock();
    let created = state.registry.extend(windows);
    state.view.screen_width = screen_width;
    state.view.screen_height = screen_height;
    state.view.offset = offset;

    info!(
        clients = pids.len(),
        windows = created,
        screen_width,
        screen_height,
        "Daemon booted"
    );
    Ok(())
}

fn register_hooks(shared: &SharedState, reporter: &ErrorReporter) -> Option<HookRegistration> {
    if !shared.multiplexer.is_used() {
        return None;
    }
    match HookRegistration::register(shared.multiplexer.clone()) {
        Ok(hooks) => Some(hooks),
        Err(e) => {
            reporter.report(&e);
            None
        }
    }
}

fn spawn_tasks<R>(
    tasks: &mut JoinSet<TaskOutcome>,
    shared: &SharedState,
    tools: &Tools,
    input: R,
    cancel: &CancellationToken,
    listen_signals: bool,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (s, c) = (shared.clone(), cancel.clone());
    tasks.spawn(async move { (TaskKind::Reactor, reactor::run(s, c).await) });

    let (s, t, c) = (shared.clone(), tools.clone(), cancel.clone());
    tasks.spawn(async move { (TaskKind::Dispatcher, commands::run(input, s, t, c).await) });

    if listen_signals {
        let (tx, c) = (shared.triggers.clone(), cancel.clone());
        tasks.spawn(async move { (TaskKind::Signals, signals::listen(tx, c).await) });
    }
}

/// Serve triggers until one ends the run
async fn serve(
    receiver: &mut mpsc::Receiver<Trigger>,
    tasks: &mut JoinSet<TaskOutcome>,
    shared: &SharedState,
    reporter: &ErrorReporter,
) -> Result<ExitReason> {
    loop {
        tokio::select! {
            biased;

            trigger = receiver.recv() => match trigger {
                Some(Trigger::Shutdown(ShutdownCause::EndOfInput)) | None => {
                    return Ok(ExitReason::EndOfInput);
                }
                Some(Trigger::Shutdown(cause)) => return Ok(ExitReason::Signal(cause)),
                Some(Trigger::Reconcile) => {
                    if let Err(e) = reconcile::reconcile(shared) {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        reporter.report(&e);
                    }
                }
                Some(Trigger::ResetTerminalInfo) => {
                    let mut state = shared.state.lock();
                    state.registry.reset_terminal_info();
                    if let Err(e) = state.redraw() {
                        if e.is_fatal() {
                            return Err(e);
                        }
                        reporter.report(&e);
                    }
                }
            },

            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                return task_ended(joined);
            }
        }
    }
}

fn task_ended(joined: std::result::Result<TaskOutcome, JoinError>) -> Result<ExitReason> {
    match joined {
        Ok((TaskKind::Dispatcher, Ok(()))) => Ok(ExitReason::EndOfInput),
        Ok((kind, Ok(()))) => {
            warn!(task = %kind, "Task ended unexpectedly");
            Ok(ExitReason::TaskEnded(kind))
        }
        Ok((kind, Err(e))) => {
            error!(task = %kind, error = %e, "Task failed");
            Err(e)
        }
        Err(e) => Err(PentimentoError::internal(format!("task panicked: {}", e))),
    }
}
