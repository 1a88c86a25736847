//! Shared daemon state
//!
//! The window registry and the view live behind one lock. Every task takes
//! it for short synchronous sections and never holds it across an await.

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use pentimento_protocol::{AddLayer, Codec, ScalerKind};
use pentimento_utils::{PentimentoError, Result};
use tokio::sync::mpsc;

use crate::loader::scaling::{self, Scaled};
use crate::loader::{ImageLoader, PixelBuffer};
use crate::reporter::ErrorReporter;
use crate::signals::Trigger;
use crate::tmux::Multiplexer;
use crate::windows::{Display, TerminalInfo, WindowRegistry};

/// Placement of the tmux pane inside the terminal, in cells
///
/// All zero when no multiplexer is in use: the pane is the whole terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Offset {
    pub top: i32,
    pub left: i32,
    /// Last row of the pane (inclusive)
    pub bottom: i32,
    /// Last column of the pane (inclusive)
    pub right: i32,
}

impl Offset {
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Pane size in cells; the whole grid when there is no pane
    pub fn pane_size(&self, term: &TerminalInfo) -> (i32, i32) {
        if self.is_zero() {
            (i32::from(term.cols), i32::from(term.rows))
        } else {
            (self.right - self.left + 1, self.bottom - self.top + 1)
        }
    }
}

/// An image placed in the view
#[derive(Debug, Clone)]
pub struct Layer {
    pub identifier: String,
    pub path: PathBuf,
    pub image: PixelBuffer,
    pub x: i32,
    pub y: i32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scaler: ScalerKind,
    pub scaling_position: (f32, f32),
}

/// Where a layer lands on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Top-left corner on the surface in pixels
    pub x: i64,
    pub y: i64,
    pub scaled: Scaled,
}

impl Layer {
    pub fn new(add: AddLayer, image: PixelBuffer) -> Self {
        Self {
            identifier: add.identifier,
            path: add.path,
            image,
            x: add.x,
            y: add.y,
            width: add.width,
            height: add.height,
            scaler: add.scaler,
            scaling_position: (add.scaling_position_x, add.scaling_position_y),
        }
    }

    /// Compute the placement inside a pane
    ///
    /// Returns `None` when the layer starts outside the pane. The drawn area
    /// never extends past the pane's right or bottom edge.
    pub fn placement(&self, offset: Offset, term: &TerminalInfo) -> Result<Option<Placement>> {
        let (pane_cols, pane_rows) = offset.pane_size(term);
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        let free_cols = i64::from(pane_cols) - x;
        let free_rows = i64::from(pane_rows) - y;
        if x < 0 || y < 0 || free_cols <= 0 || free_rows <= 0 {
            return Ok(None);
        }

        let cols = self.width.map_or(free_cols, |w| i64::from(w).min(free_cols));
        let rows = self.height.map_or(free_rows, |h| i64::from(h).min(free_rows));

        let area = (pixels(cols, term.font_width)?, pixels(rows, term.font_height)?);
        let scaled = scaling::scale(self.scaler, self.image.dimensions(), area, self.scaling_position)?;
        let (x, y) = term.cell_origin(i64::from(offset.left) + x, i64::from(offset.top) + y);

        Ok(Some(Placement { x, y, scaled }))
    }
}

/// Pixel length of `cells` cells of `cell_size` pixels each
fn pixels(cells: i64, cell_size: u32) -> Result<u32> {
    cells
        .checked_mul(i64::from(cell_size))
        .and_then(|p| u32::try_from(p).ok())
        .ok_or_else(|| {
            PentimentoError::geometry(format!(
                "{} cells of {} pixels exceed the pixel range",
                cells, cell_size
            ))
        })
}

/// What the windows should show
#[derive(Debug, Clone, Default)]
pub struct View {
    pub offset: Offset,
    /// Layers by identifier, in insertion order
    pub media: IndexMap<String, Layer>,
    pub screen_width: u32,
    pub screen_height: u32,
}

impl View {
    /// Insert or replace a layer; a replaced layer keeps its position
    ///
    /// Returns whether a layer with the same identifier existed.
    pub fn insert(&mut self, layer: Layer) -> bool {
        self.media.insert(layer.identifier.clone(), layer).is_some()
    }

    pub fn remove(&mut self, identifier: &str) -> Option<Layer> {
        self.media.shift_remove(identifier)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.media.keys().map(String::as_str).collect()
    }
}

/// Registry and view, guarded together
#[derive(Debug, Default)]
pub struct DaemonState {
    pub registry: WindowRegistry,
    pub view: View,
}

impl DaemonState {
    /// Draw the current view on every window
    pub fn redraw(&mut self) -> Result<()> {
        self.registry.draw(&self.view)
    }
}

/// Immutable helpers handed to the command dispatcher
#[derive(Debug, Clone)]
pub struct Tools {
    pub loader: Arc<dyn ImageLoader>,
    pub codec: Arc<dyn Codec>,
    pub reporter: ErrorReporter,
}

/// Handles cloned into every task
#[derive(Debug, Clone)]
pub struct SharedState {
    pub state: Arc<Mutex<DaemonState>>,
    pub display: Arc<dyn Display>,
    pub multiplexer: Arc<dyn Multiplexer>,
    pub triggers: mpsc::Sender<Trigger>,
}

impl SharedState {
    pub fn new(
        display: Arc<dyn Display>,
        multiplexer: Arc<dyn Multiplexer>,
        triggers: mpsc::Sender<Trigger>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(DaemonState::default())),
            display,
            multiplexer,
            triggers,
        }
    }
}
