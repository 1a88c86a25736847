//! Shutdown coordination
//!
//! [`ShutdownCoordinator`] cancels and joins the scheduled tasks exactly once.
//! [`Teardown`] destroys the windows and closes the loader exactly once, when
//! the run ends by any path.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use pentimento_utils::PentimentoError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::loader::ImageLoader;
use crate::state::DaemonState;

/// Tasks owned by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Reactor,
    Dispatcher,
    Signals,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Reactor => "reactor",
            TaskKind::Dispatcher => "dispatcher",
            TaskKind::Signals => "signals",
        })
    }
}

/// What a finished task reports back
pub type TaskOutcome = (TaskKind, pentimento_utils::Result<()>);

/// Cancels every task once and collects what they return
#[derive(Debug)]
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    completed: bool,
}

impl ShutdownCoordinator {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            completed: false,
        }
    }

    /// Cancel and join every task in `tasks`
    ///
    /// Errors are collected, not propagated. A second call is a no-op and
    /// returns no errors.
    pub async fn shutdown(&mut self, tasks: &mut JoinSet<TaskOutcome>) -> Vec<PentimentoError> {
        if std::mem::replace(&mut self.completed, true) {
            return Vec::new();
        }

        info!(tasks = tasks.len(), "Shutting down");
        self.cancel.cancel();

        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, Ok(()))) => debug!(task = %kind, "Task stopped"),
                Ok((kind, Err(e))) => {
                    warn!(task = %kind, error = %e, "Task failed during shutdown");
                    errors.push(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => errors.push(PentimentoError::internal(format!("task panicked: {}", e))),
            }
        }

        errors
    }
}

/// Run-scoped guard releasing windows and the loader
pub struct Teardown {
    state: Arc<Mutex<DaemonState>>,
    loader: Arc<dyn ImageLoader>,
    done: bool,
}

impl Teardown {
    pub fn new(state: Arc<Mutex<DaemonState>>, loader: Arc<dyn ImageLoader>) -> Self {
        Self {
            state,
            loader,
            done: false,
        }
    }

    /// Destroy every window and close the loader; later calls do nothing
    pub fn run(&mut self) {
        if std::mem::replace(&mut self.done, true) {
            return;
        }

        let destroyed = self.state.lock().registry.destroy_all();
        self.loader.close();
        info!(windows = destroyed, "Teardown complete");
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PixelBuffer;
    use futures::future::BoxFuture;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingLoader {
        closes: AtomicUsize,
    }

    impl ImageLoader for CountingLoader {
        fn load(&self, _path: &Path) -> BoxFuture<'static, pentimento_utils::Result<PixelBuffer>> {
            Box::pin(async { Err(PentimentoError::LoaderClosed) })
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_shutdown_cancels_and_collects() {
        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();

        let token = cancel.clone();
        tasks.spawn(async move {
            token.cancelled().await;
            (TaskKind::Reactor, Ok(()))
        });
        tasks.spawn(async {
            (
                TaskKind::Dispatcher,
                Err(PentimentoError::internal("dispatcher broke")),
            )
        });

        let mut coordinator = ShutdownCoordinator::new(cancel.clone());
        let errors = coordinator.shutdown(&mut tasks).await;

        assert!(cancel.is_cancelled());
        assert!(tasks.is_empty());
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_runs_once() {
        let cancel = CancellationToken::new();
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        tasks.spawn(async { (TaskKind::Signals, Err(PentimentoError::internal("x"))) });

        let mut coordinator = ShutdownCoordinator::new(cancel);
        assert_eq!(coordinator.shutdown(&mut tasks).await.len(), 1);

        tasks.spawn(async { (TaskKind::Signals, Err(PentimentoError::internal("y"))) });
        assert!(coordinator.shutdown(&mut tasks).await.is_empty());
        assert_eq!(tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_reports_panics() {
        let mut tasks: JoinSet<TaskOutcome> = JoinSet::new();
        tasks.spawn(async {
            if true {
                panic!("boom");
            }
            (TaskKind::Reactor, Ok(()))
        });

        let errors = ShutdownCoordinator::new(CancellationToken::new())
            .shutdown(&mut tasks)
            .await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), "InternalError");
    }

    #[test]
    fn test_teardown_runs_once() {
        let state = Arc::new(Mutex::new(DaemonState::default()));
        let loader = Arc::new(CountingLoader::default());

        let mut teardown = Teardown::new(state, loader.clone());
        teardown.run();
        teardown.run();
        drop(teardown);

        assert_eq!(loader.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_on_drop() {
        let state = Arc::new(Mutex::new(DaemonState::default()));
        let loader = Arc::new(CountingLoader::default());

        drop(Teardown::new(state, loader.clone()));
        assert_eq!(loader.closes.load(Ordering::SeqCst), 1);
    }
}
