#![warn(clippy::pedantic)]

pub mod buffer;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod source;
pub mod streaming;

pub use buffer::SlidingBuffer;
pub use config::{DEFAULT_BUFFER_CAPACITY, DecoderConfig};
pub use decoder::{EventDecoder, Events, SessionState};
pub use error::DecodeError;
pub use event::Event;
pub use source::ByteSource;
pub use streaming::AsyncEventDecoder;
