use std::io;
use std::sync::Arc;

use inwatch_wire::WireError;

/// Errors that can occur while decoding an inotify event stream.
///
/// Every variant except [`Configuration`](Self::Configuration) is
/// terminal for the session that produced it: the decoder remembers the
/// error and returns a clone of it on every later call without touching
/// the byte source again. That is why the type is `Clone` and the I/O
/// error sits behind an `Arc`.
///
/// End of stream is not an error. It is reported as `Ok(None)`.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── Configuration     ← buffer smaller than one header (construction)
///   ├── RecordTooLarge    ← header announces a record the buffer can't hold
///   ├── Wire(WireError)   ← header bytes could not be parsed
///   └── Io(io::Error)     ← the byte source failed while filling
/// ```
#[derive(Clone, Debug, thiserror::Error)]
pub enum DecodeError {
    /// The configured buffer cannot hold even one record header.
    ///
    /// Raised by the decoder constructors, never by `next_event`.
    #[error("event buffer capacity {capacity} is smaller than one record header ({minimum} bytes)")]
    Configuration { capacity: usize, minimum: usize },

    /// A header announced a payload so long that header plus payload
    /// exceeds the buffer capacity. The stream cannot be resynchronised
    /// past such a record, so the session fails.
    ///
    /// `offset` is the position of the record's first byte, counted from
    /// the start of the stream.
    #[error("record of {record_len} bytes at stream offset {offset} exceeds the {capacity}-byte event buffer")]
    RecordTooLarge {
        record_len: usize,
        capacity: usize,
        offset: u64,
    },

    /// A wire-level parsing error from `inwatch-wire`.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The byte source reported an error while the buffer was filling.
    #[error(transparent)]
    Io(Arc<io::Error>),
}

impl DecodeError {
    /// Kind of the underlying I/O error, if this is one.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}
