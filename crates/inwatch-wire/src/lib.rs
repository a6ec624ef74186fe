#![warn(clippy::pedantic)]

//! Wire layout of the Linux inotify event stream: the fixed record
//! header, the event mask bits, and an encoder for kernel-shaped records.

pub mod error;
pub mod header;
pub mod mask;
pub mod record;

pub use error::WireError;
pub use header::{EventHeader, HEADER_SIZE, MIN_BUFFER_SIZE, NAME_MAX};
pub use mask::EventMask;
pub use record::{KERNEL_ALIGN, RecordBuilder, encode_record};
