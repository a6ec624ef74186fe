use std::io;

use inwatch_wire::HEADER_SIZE;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::buffer::SlidingBuffer;
use crate::config::DecoderConfig;
use crate::decoder::{Session, SessionState};
use crate::error::DecodeError;
use crate::event::Event;

/// Asynchronous counterpart of [`EventDecoder`](crate::EventDecoder).
///
/// Same sliding buffer, same record rules, same sticky terminal states;
/// the only difference is that filling the buffer awaits an
/// [`AsyncRead`] instead of blocking the thread. Useful when the inotify
/// descriptor is opened non-blocking and registered with the runtime, or
/// for decoding captured streams from async files and sockets.
///
/// # Example
///
/// ```rust,no_run
/// use inwatch_decoder::AsyncEventDecoder;
/// use tokio::io::AsyncRead;
///
/// async fn print_events(reader: impl AsyncRead + Unpin) {
///     let mut decoder = AsyncEventDecoder::new(reader).unwrap();
///     while let Some(event) = decoder.next_event().await.unwrap() {
///         println!("{} {:?}", event.mask, event.name);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct AsyncEventDecoder<R> {
    reader: R,
    buffer: SlidingBuffer,
    session: Session,
}

impl<R: AsyncRead + Unpin> AsyncEventDecoder<R> {
    /// Create a decoder with the default configuration.
    ///
    /// # Errors
    ///
    /// Infallible with the default capacity.
    pub fn new(reader: R) -> Result<Self, DecodeError> {
        Self::with_config(reader, DecoderConfig::default())
    }

    /// Create a decoder from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Configuration`] if the configured capacity is
    /// smaller than one record header.
    pub fn with_config(reader: R, config: DecoderConfig) -> Result<Self, DecodeError> {
        config.validate()?;
        Ok(Self {
            reader,
            buffer: SlidingBuffer::new(config.buffer_capacity),
            session: Session::Ready,
        })
    }

    /// Decode the next event.
    ///
    /// Returns `Ok(Some(event))` for each record and `Ok(None)` at end of
    /// stream. Cancelling the returned future between reads is safe: bytes
    /// already read stay in the buffer and the next call resumes from them.
    ///
    /// # Errors
    ///
    /// Same as [`EventDecoder::next_event`](crate::EventDecoder::next_event).
    pub async fn next_event(&mut self) -> Result<Option<Event>, DecodeError> {
        if let Some(result) = self.session.terminal() {
            return result;
        }
        let outcome = self.decode_record().await;
        self.session.settle(&self.buffer, outcome)
    }

    async fn decode_record(&mut self) -> Result<Option<Event>, DecodeError> {
        if !self.fill_to(HEADER_SIZE).await? {
            return Ok(None);
        }

        let header = self.buffer.peek_header()?;
        let record_len = self.buffer.check_record(&header)?;

        if !self.fill_to(record_len).await? {
            return Ok(None);
        }

        Ok(Some(self.buffer.take_record(&header)))
    }

    async fn fill_to(&mut self, want: usize) -> Result<bool, DecodeError> {
        while let Some(spare) = self.buffer.reserve_for(want) {
            let read = self.reader.read(spare).await;
            match read {
                Ok(0) => return Ok(false),
                Ok(n) => self.buffer.commit(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}

impl<R> AsyncEventDecoder<R> {
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.buffered()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inwatch_wire::{EventMask, encode_record};

    fn stream() -> Vec<u8> {
        let mut bytes = encode_record(1, EventMask::MOVED_FROM, 77, Some("old")).unwrap();
        bytes.extend(encode_record(1, EventMask::MOVED_TO, 77, Some("new")).unwrap());
        bytes
    }

    #[tokio::test]
    async fn decodes_from_async_reader() {
        let bytes = stream();
        let mut decoder = AsyncEventDecoder::new(bytes.as_slice()).unwrap();

        let from = decoder.next_event().await.unwrap().unwrap();
        let to = decoder.next_event().await.unwrap().unwrap();
        assert_eq!(from.cookie, to.cookie);
        assert_eq!(from.name(), Some("old"));
        assert_eq!(to.name(), Some("new"));
        assert!(decoder.next_event().await.unwrap().is_none());
        assert_eq!(decoder.state(), SessionState::EndOfStream);
    }

    #[tokio::test]
    async fn reassembles_fragmented_delivery() {
        let bytes = stream();
        let (mut tx, rx) = tokio::io::duplex(7);

        let writer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            for chunk in bytes.chunks(5) {
                tx.write_all(chunk).await.unwrap();
            }
        });

        let mut decoder = AsyncEventDecoder::with_config(rx, DecoderConfig::with_capacity(40)).unwrap();
        let mut names = Vec::new();
        while let Some(event) = decoder.next_event().await.unwrap() {
            names.push(event.name.unwrap());
        }
        writer.await.unwrap();
        assert_eq!(names, vec!["old", "new"]);
    }

    #[tokio::test]
    async fn rejects_small_buffer() {
        let err = AsyncEventDecoder::with_config(tokio::io::empty(), DecoderConfig::with_capacity(4))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Configuration { .. }));
    }
}
