//! pentimento-protocol: the line-oriented command protocol
//!
//! This crate defines how one line of standard input becomes a typed
//! [`Action`], and how error records are written back:
//!
//! - [`Fields`]: the named-field mapping every codec produces
//! - [`Codec`] implementations selected by [`CodecKind`] (json, simple, bash)
//! - [`Action`]: the closed set of commands the daemon understands
//! - [`CommandCodec`]: `tokio-util` framing for stdin lines and stderr records

pub mod action;
pub mod codec;
pub mod fields;
pub mod framing;

// Re-export main types at crate root
pub use action::{Action, ActionKind, AddLayer, RemoveLayer, ScalerKind};
pub use codec::{Codec, CodecError, CodecKind};
pub use fields::Fields;
pub use framing::{error_record, unescape, CommandCodec, Frame, MAX_LINE_LENGTH};
