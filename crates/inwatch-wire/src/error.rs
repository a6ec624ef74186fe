/// Errors raised while reading or writing inotify records.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// Input ended before a complete header or payload could be read.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// A mask name given to [`EventMask::from_str`](crate::mask::EventMask)
    /// is not one of the documented symbolic bits.
    #[error("unknown event mask name {name:?}")]
    UnknownMaskName { name: String },

    /// A record payload would not fit in the 32-bit `len` field.
    #[error("record payload of {len} bytes does not fit the len field")]
    PayloadTooLong { len: usize },
}

// Context on each variant matters more here than in most crates: the
// offset in `UnexpectedEof` is the byte position the read gave up at,
// which is the first thing to check when a captured stream misdecodes.
