//! Error records on stderr
//!
//! Recoverable errors are written back to the controlling process as one
//! record per line, encoded with the same codec as the command stream.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::Mutex;
use pentimento_protocol::{error_record, Codec, CommandCodec};
use pentimento_utils::PentimentoError;
use tokio_util::codec::Encoder;
use tracing::warn;

type Sink = Box<dyn Write + Send>;

/// Writes error records to a sink
#[derive(Clone)]
pub struct ErrorReporter {
    codec: Arc<dyn Codec>,
    sink: Arc<Mutex<Sink>>,
    reported: Arc<AtomicU64>,
}

impl ErrorReporter {
    pub fn new(codec: Arc<dyn Codec>, sink: impl Write + Send + 'static) -> Self {
        Self {
            codec,
            sink: Arc::new(Mutex::new(Box::new(sink))),
            reported: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Reporter writing to the process's stderr
    pub fn stderr(codec: Arc<dyn Codec>) -> Self {
        Self::new(codec, std::io::stderr())
    }

    /// Write one record for `err`
    pub fn report(&self, err: &PentimentoError) {
        self.reported.fetch_add(1, Ordering::Relaxed);
        tracing::info!(kind = err.kind(), error = %err, "Reporting error");

        let record = error_record(err.kind(), err.to_string());
        let mut buf = BytesMut::new();
        if let Err(e) = CommandCodec::new(self.codec.clone()).encode(record, &mut buf) {
            warn!(error = %e, "Failed to encode error record");
            return;
        }

        let mut sink = self.sink.lock();
        if let Err(e) = sink.write_all(&buf).and_then(|_| sink.flush()) {
            warn!(error = %e, "Failed to write error record");
        }
    }

    /// Number of records reported so far
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("codec", &self.codec.name())
            .field("reported", &self.reported())
            .finish()
    }
}

/// In-memory sink for tests
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
