//! Line framing for the command stream
//!
//! [`CommandCodec`] wraps a `tokio-util` [`LinesCodec`] and the active
//! [`Codec`]: decoding yields one [`Frame`] per input line, encoding writes one
//! record per line using the same codec.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::codec::{Codec, CodecError};
use crate::fields::Fields;

/// Upper bound on a single command line
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// The encodings cannot carry a literal `$`, so writers send `\$` instead
pub fn unescape(line: &str) -> Cow<'_, str> {
    if line.contains("\\$") {
        Cow::Owned(line.replace("\\$", "$"))
    } else {
        Cow::Borrowed(line)
    }
}

/// Build an error record: `type=error`, `name=<kind>`, `message=<detail>`
pub fn error_record(name: &str, message: impl Into<String>) -> Fields {
    Fields::new()
        .with("type", "error")
        .with("name", name)
        .with("message", message.into())
}

/// One decoded input line
#[derive(Debug)]
pub enum Frame {
    /// Empty line; the writer is done
    End,
    /// A non-empty line run through the codec
    Command(Result<Fields, CodecError>),
}

/// `Decoder`/`Encoder` pair for the command protocol
#[derive(Debug)]
pub struct CommandCodec {
    lines: LinesCodec,
    codec: Arc<dyn Codec>,
}

impl CommandCodec {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            codec,
        }
    }

    fn frame(&self, line: String) -> Frame {
        if line.is_empty() {
            return Frame::End;
        }
        Frame::Command(self.codec.parse(&unescape(&line)))
    }

    /// An overlong or non-UTF-8 line is a bad command, not a broken stream:
    /// the lines codec has already consumed it and resumes at the next newline.
    /// Its only `Io` error is the UTF-8 check; reader errors bypass this path.
    fn lift(&self, line: Result<Option<String>, LinesCodecError>) -> io::Result<Option<Frame>> {
        match line {
            Ok(line) => Ok(line.map(|line| self.frame(line))),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                Ok(Some(Frame::Command(Err(CodecError::LineTooLong {
                    max: MAX_LINE_LENGTH,
                }))))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(Frame::Command(Err(CodecError::InvalidUtf8))))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Decoder for CommandCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let line = self.lines.decode(src);
        self.lift(line)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let line = self.lines.decode_eof(src);
        self.lift(line)
    }
}

impl Encoder<Fields> for CommandCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Fields, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = self.codec.unparse(&item);
        dst.reserve(line.len() + 1);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
