//! Terminal cell geometry
//!
//! Images are positioned in terminal cells, so every window needs the cell
//! size in pixels and the padding between the surface edge and the grid.

use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Grid used when the pty cannot be queried
const FALLBACK_GRID: (u16, u16) = (80, 24);

/// Raw `TIOCGWINSZ` reply
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Winsize {
    pub rows: u16,
    pub cols: u16,
    pub xpixel: u16,
    pub ypixel: u16,
}

impl Winsize {
    /// Query the window size of a tty
    pub fn of(tty: &Path) -> std::io::Result<Self> {
        let file = File::open(tty)?;
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };

        // SAFETY: fd is open for the duration of the call and ws is a valid
        // out-pointer of the type TIOCGWINSZ expects.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }

        Ok(Self {
            rows: ws.ws_row,
            cols: ws.ws_col,
            xpixel: ws.ws_xpixel,
            ypixel: ws.ws_ypixel,
        })
    }
}

/// Cell grid of the terminal shown in a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalInfo {
    pub cols: u16,
    pub rows: u16,
    /// Cell size in pixels
    pub font_width: u32,
    pub font_height: u32,
    /// Space between the surface edge and the grid, per side
    pub padding_horizontal: u32,
    pub padding_vertical: u32,
}

impl TerminalInfo {
    /// Derive the grid from a winsize and the surface size
    ///
    /// Terminals that do not report a pixel size get their cell size from
    /// the surface instead.
    pub fn from_winsize(ws: Winsize, surface_width: u32, surface_height: u32) -> Self {
        let cols = ws.cols.max(1);
        let rows = ws.rows.max(1);

        let (font_width, font_height) = if ws.xpixel > 0 && ws.ypixel > 0 {
            (u32::from(ws.xpixel) / u32::from(cols), u32::from(ws.ypixel) / u32::from(rows))
        } else {
            (surface_width / u32::from(cols), surface_height / u32::from(rows))
        };
        let font_width = font_width.max(1);
        let font_height = font_height.max(1);

        Self {
            cols,
            rows,
            font_width,
            font_height,
            padding_horizontal: surface_width.saturating_sub(u32::from(cols) * font_width) / 2,
            padding_vertical: surface_height.saturating_sub(u32::from(rows) * font_height) / 2,
        }
    }

    /// Query `pty`, falling back to an 80x24 grid
    pub fn query(pty: Option<&Path>, surface_width: u32, surface_height: u32) -> Self {
        let ws = pty
            .and_then(|p| match Winsize::of(p) {
                Ok(ws) if ws.cols > 0 && ws.rows > 0 => Some(ws),
                Ok(_) => None,
                Err(e) => {
                    debug!(pty = %p.display(), error = %e, "TIOCGWINSZ failed");
                    None
                }
            })
            .unwrap_or(Winsize {
                cols: FALLBACK_GRID.0,
                rows: FALLBACK_GRID.1,
                ..Winsize::default()
            });

        Self::from_winsize(ws, surface_width, surface_height)
    }

    /// Pixel position of the top-left corner of a cell
    pub fn cell_origin(&self, col: i64, row: i64) -> (i64, i64) {
        (
            i64::from(self.padding_horizontal) + col * i64::from(self.font_width),
            i64::from(self.padding_vertical) + row * i64::from(self.font_height),
        )
    }
}

/// Controlling terminal of a process, read from `/proc/<pid>/fd/0`
pub fn pty_of(pid: u32) -> Option<PathBuf> {
    let target = std::fs::read_link(format!("/proc/{}/fd/0", pid)).ok()?;
    target.starts_with("/dev/pts").then_some(target)
}
