//! Image decoding
//!
//! Loaders turn a path into an RGBA buffer. The synchronous loader decodes on
//! the scheduler thread; the thread loader hands the work to tokio's blocking
//! pool so the event loop keeps running while large images decode.

pub mod scaling;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use image::RgbaImage;
use pentimento_utils::{PentimentoError, Result};
use serde::{Deserialize, Serialize};

/// Decoded image shared between the view and the windows drawing it
pub type PixelBuffer = Arc<RgbaImage>;

/// Image decode backend
pub trait ImageLoader: Send + Sync + fmt::Debug {
    /// Decode the image at `path`
    fn load(&self, path: &Path) -> BoxFuture<'static, Result<PixelBuffer>>;

    /// Refuse further loads
    fn close(&self);
}

/// Loader selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderKind {
    Synchronous,
    #[default]
    Thread,
}

impl LoaderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoaderKind::Synchronous => "synchronous",
            LoaderKind::Thread => "thread",
        }
    }

    pub fn build(self) -> Arc<dyn ImageLoader> {
        match self {
            LoaderKind::Synchronous => Arc::new(SynchronousLoader::default()),
            LoaderKind::Thread => Arc::new(ThreadLoader::default()),
        }
    }
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoaderKind {
    type Err = PentimentoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "synchronous" => Ok(LoaderKind::Synchronous),
            "thread" => Ok(LoaderKind::Thread),
            other => Err(PentimentoError::config(format!(
                "unknown loader '{}' (expected synchronous or thread)",
                other
            ))),
        }
    }
}

/// Decode on the calling thread
#[derive(Debug, Default)]
pub struct SynchronousLoader {
    closed: AtomicBool,
}

impl ImageLoader for SynchronousLoader {
    fn load(&self, path: &Path) -> BoxFuture<'static, Result<PixelBuffer>> {
        let result = if self.closed.load(Ordering::Acquire) {
            Err(PentimentoError::LoaderClosed)
        } else {
            decode(path).map(Arc::new)
        };
        future::ready(result).boxed()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Decode on the blocking pool
#[derive(Debug, Default)]
pub struct ThreadLoader {
    closed: AtomicBool,
}

impl ImageLoader for ThreadLoader {
    fn load(&self, path: &Path) -> BoxFuture<'static, Result<PixelBuffer>> {
        if self.closed.load(Ordering::Acquire) {
            return future::ready(Err(PentimentoError::LoaderClosed)).boxed();
        }

        let path = path.to_path_buf();
        async move {
            match tokio::task::spawn_blocking(move || decode(&path).map(Arc::new)).await {
                Ok(result) => result,
                Err(e) => Err(PentimentoError::internal(format!(
                    "image decode task failed: {}",
                    e
                ))),
            }
        }
        .boxed()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn decode(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path).map_err(|e| image_error(path.to_path_buf(), e))?;
    let rgba = image.into_rgba8();
    tracing::debug!(
        path = %path.display(),
        width = rgba.width(),
        height = rgba.height(),
        "Image decoded"
    );
    Ok(rgba)
}

fn image_error(path: PathBuf, err: image::ImageError) -> PentimentoError {
    PentimentoError::ImageLoad {
        path,
        message: err.to_string(),
    }
}
