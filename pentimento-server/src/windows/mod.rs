//! Windowing collaborator
//!
//! A [`Display`] is the connection to a display server. It discovers the
//! parent surfaces (terminal windows) of a set of client processes and creates
//! one child [`Window`] per surface. Events arrive on a single connection
//! queue that every window inspects in turn.

mod headless;
mod registry;
pub mod terminal;

use std::fmt;
use std::path::PathBuf;

use futures::future::BoxFuture;
use pentimento_utils::Result;

use crate::state::View;

pub use headless::{HeadlessDisplay, HeadlessLog, RecordedFrame};
pub use registry::WindowRegistry;
pub use terminal::TerminalInfo;

/// Display-server side identifier of a window or surface
pub type WindowId = u64;

/// A parent surface a child window is anchored to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    /// Surface id; unique per display
    pub id: WindowId,
    /// Process that owns the terminal shown in the surface
    pub pid: u32,
    /// Controlling pty of `pid`, used for the cell grid
    pub pty: Option<PathBuf>,
    /// Surface size in pixels
    pub width: u32,
    pub height: u32,
}

/// An event read from the display connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEvent {
    /// Window the event is addressed to
    pub window: WindowId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Contents were lost and must be repainted
    Expose,
    /// The parent surface was resized
    Configure { width: u32, height: u32 },
    /// Anything a window does not act on
    Other,
}

/// Connection to a display server
pub trait Display: Send + Sync + fmt::Debug {
    /// Size of the whole screen in pixels
    fn screen_size(&self) -> (u32, u32);

    /// Parent surfaces of the given client processes
    fn parent_infos(&self, client_pids: &[u32]) -> Result<Vec<ParentInfo>>;

    /// Create one child window per parent surface
    fn create_windows(&self, parents: &[ParentInfo]) -> Result<Vec<Box<dyn Window>>>;

    /// Resolve once the connection queue holds an event
    ///
    /// Does not consume the event. Fails with a connection-lost error once
    /// the connection is gone.
    fn wait_for_event(&self) -> BoxFuture<'_, Result<()>>;

    /// Drop the event at the head of the queue
    fn discard_event(&self) -> Option<DisplayEvent>;
}

/// A child window anchored to one parent surface
pub trait Window: Send + fmt::Debug {
    fn id(&self) -> WindowId;

    fn parent_id(&self) -> WindowId;

    /// Paint every layer of `view`
    fn draw(&mut self, view: &View) -> Result<()>;

    /// Handle the event at the head of the connection queue if it is
    /// addressed to this window
    ///
    /// Returns whether the event was claimed (and consumed). A claim pops the
    /// head, so later windows would only see the next event; callers stop
    /// offering at the first claim.
    fn process_event(&mut self, view: &View) -> bool;

    /// Re-read the terminal's cell grid, e.g. after SIGWINCH
    fn reset_terminal_info(&mut self);

    /// Release the window on the display server
    fn destroy(&mut self);
}
