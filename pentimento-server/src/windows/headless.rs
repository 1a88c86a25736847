//! In-process display backend
//!
//! Keeps an event queue and records what every window would paint instead of
//! talking to a display server. Each client process gets one surface the size
//! of the screen.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use pentimento_utils::{PentimentoError, Result};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use super::terminal::{self, TerminalInfo};
use super::{Display, DisplayEvent, EventKind, ParentInfo, Window, WindowId};
use crate::state::{Placement, View};

/// One painted frame
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    pub window: WindowId,
    /// Visible layers in paint order
    pub layers: Vec<(String, Placement)>,
}

/// Entries kept per list of the observation log
pub const LOG_CAPACITY: usize = 256;

/// What the headless display observed
///
/// Lists keep the most recent [`LOG_CAPACITY`] entries; the counters cover
/// the whole lifetime.
#[derive(Debug, Clone, Default)]
pub struct HeadlessLog {
    pub created: VecDeque<WindowId>,
    pub destroyed: VecDeque<WindowId>,
    pub frames: VecDeque<RecordedFrame>,
    pub discarded: VecDeque<DisplayEvent>,
    pub draws: u64,
    pub repaints: u64,
}

fn record<T>(list: &mut VecDeque<T>, item: T) {
    if list.len() == LOG_CAPACITY {
        list.pop_front();
    }
    list.push_back(item);
}

#[derive(Debug)]
struct Inner {
    screen: (u32, u32),
    queue: Mutex<VecDeque<DisplayEvent>>,
    notify: Notify,
    closed: AtomicBool,
    next_window_id: AtomicU64,
    log: Mutex<HeadlessLog>,
}

impl Inner {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PentimentoError::connection_lost("headless display closed"));
        }
        Ok(())
    }

    async fn wait_for_event(&self) -> Result<()> {
        loop {
            // Register before checking so a push in between is not missed
            let notified = self.notify.notified();
            self.ensure_open()?;
            if !self.queue.lock().is_empty() {
                return Ok(());
            }
            notified.await;
        }
    }
}

/// Display without a display server
#[derive(Debug, Clone)]
pub struct HeadlessDisplay {
    inner: Arc<Inner>,
}

impl HeadlessDisplay {
    pub fn new(screen_width: u32, screen_height: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                screen: (screen_width, screen_height),
                queue: Mutex::new(VecDeque::new()),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                next_window_id: AtomicU64::new(1),
                log: Mutex::new(HeadlessLog::default()),
            }),
        }
    }

    /// Queue an event as if the server had sent it
    pub fn push_event(&self, event: DisplayEvent) {
        self.inner.queue.lock().push_back(event);
        self.inner.notify.notify_one();
    }

    /// Drop the connection; waiters fail with a connection-lost error
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.notify.notify_one();
    }

    pub fn pending_events(&self) -> usize {
        self.inner.queue.lock().len()
    }

    /// Snapshot of the observation log
    pub fn log(&self) -> HeadlessLog {
        self.inner.log.lock().clone()
    }
}

impl Display for HeadlessDisplay {
    fn screen_size(&self) -> (u32, u32) {
        self.inner.screen
    }

    fn parent_infos(&self, client_pids: &[u32]) -> Result<Vec<ParentInfo>> {
        self.inner.ensure_open()?;

        let (width, height) = self.inner.screen;
        let mut seen = HashSet::new();
        Ok(client_pids
            .iter()
            .filter(|pid| seen.insert(**pid))
            .map(|&pid| ParentInfo {
                id: WindowId::from(pid),
                pid,
                pty: terminal::pty_of(pid),
                width,
                height,
            })
            .collect())
    }

    fn create_windows(&self, parents: &[ParentInfo]) -> Result<Vec<Box<dyn Window>>> {
        self.inner.ensure_open()?;

        let windows = parents
            .iter()
            .map(|parent| {
                let id = self.inner.next_window_id.fetch_add(1, Ordering::Relaxed);
                record(&mut self.inner.log.lock().created, id);
                debug!(window_id = id, parent_id = parent.id, pid = parent.pid, "Window created");

                Box::new(HeadlessWindow {
                    id,
                    terminal: TerminalInfo::query(parent.pty.as_deref(), parent.width, parent.height),
                    parent: parent.clone(),
                    inner: self.inner.clone(),
                    destroyed: false,
                }) as Box<dyn Window>
            })
            .collect();

        Ok(windows)
    }

    fn wait_for_event(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.inner.wait_for_event())
    }

    fn discard_event(&self) -> Option<DisplayEvent> {
        let event = self.inner.queue.lock().pop_front()?;
        trace!(?event, "Event discarded");
        record(&mut self.inner.log.lock().discarded, event.clone());
        Some(event)
    }
}

#[derive(Debug)]
struct HeadlessWindow {
    id: WindowId,
    parent: ParentInfo,
    terminal: TerminalInfo,
    inner: Arc<Inner>,
    destroyed: bool,
}

impl Window for HeadlessWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn parent_id(&self) -> WindowId {
        self.parent.id
    }

    fn draw(&mut self, view: &View) -> Result<()> {
        self.inner.ensure_open()?;

        let mut layers = Vec::with_capacity(view.media.len());
        for layer in view.media.values() {
            match layer.placement(view.offset, &self.terminal) {
                Ok(Some(placement)) => layers.push((layer.identifier.clone(), placement)),
                Ok(None) => {}
                Err(e) => warn!(
                    window_id = self.id,
                    identifier = %layer.identifier,
                    error = %e,
                    "Layer skipped"
                ),
            }
        }

        let mut log = self.inner.log.lock();
        log.draws += 1;
        record(
            &mut log.frames,
            RecordedFrame {
                window: self.id,
                layers,
            },
        );
        Ok(())
    }

    fn process_event(&mut self, view: &View) -> bool {
        let event = {
            let mut queue = self.inner.queue.lock();
            if queue.front().is_some_and(|e| e.window == self.id) {
                queue.pop_front()
            } else {
                None
            }
        };
        let Some(event) = event else {
            return false;
        };

        match event.kind {
            EventKind::Expose => {
                self.inner.log.lock().repaints += 1;
                if let Err(e) = self.draw(view) {
                    warn!(window_id = self.id, error = %e, "Repaint failed");
                }
            }
            EventKind::Configure { width, height } => {
                self.parent.width = width;
                self.parent.height = height;
                self.reset_terminal_info();
            }
            EventKind::Other => {}
        }
        true
    }

    fn reset_terminal_info(&mut self) {
        self.terminal =
            TerminalInfo::query(self.parent.pty.as_deref(), self.parent.width, self.parent.height);
    }

    fn destroy(&mut self) {
        if !std::mem::replace(&mut self.destroyed, true) {
            record(&mut self.inner.log.lock().destroyed, self.id);
            debug!(window_id = self.id, "Window destroyed");
        }
    }
}
