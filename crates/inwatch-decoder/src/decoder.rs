use std::io;

use inwatch_wire::HEADER_SIZE;

use crate::buffer::SlidingBuffer;
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::event::Event;
use crate::source::ByteSource;

/// Observable state of a decoding session.
///
/// ```text
///   Ready ──decode ok──▶ Ready
///   Ready ──source returns 0──▶ EndOfStream   (terminal)
///   Ready ──source error / bad record──▶ Failed (terminal)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    EndOfStream,
    Failed,
}

/// Terminal-state bookkeeping shared by the blocking and async decoders.
#[derive(Debug)]
pub(crate) enum Session {
    Ready,
    EndOfStream,
    Failed(DecodeError),
}

impl Session {
    pub(crate) fn state(&self) -> SessionState {
        match self {
            Self::Ready => SessionState::Ready,
            Self::EndOfStream => SessionState::EndOfStream,
            Self::Failed(_) => SessionState::Failed,
        }
    }

    /// The sticky result of a terminal session, or `None` if the session
    /// may still decode.
    pub(crate) fn terminal(&self) -> Option<Result<Option<Event>, DecodeError>> {
        match self {
            Self::Ready => None,
            Self::EndOfStream => Some(Ok(None)),
            Self::Failed(err) => Some(Err(err.clone())),
        }
    }

    /// Record the outcome of one decode attempt and pass it through.
    pub(crate) fn settle(
        &mut self,
        buffer: &SlidingBuffer,
        outcome: Result<Option<Event>, DecodeError>,
    ) -> Result<Option<Event>, DecodeError> {
        match &outcome {
            Ok(Some(_)) => {}
            Ok(None) => {
                let discarded = buffer.buffered();
                if discarded > 0 {
                    tracing::warn!(
                        discarded,
                        offset = buffer.stream_offset(),
                        "event stream ended inside a record"
                    );
                }
                tracing::debug!("event stream reached end of stream");
                *self = Self::EndOfStream;
            }
            Err(err) => {
                tracing::debug!(error = %err, "event decoder failed");
                *self = Self::Failed(err.clone());
            }
        }
        outcome
    }
}

/// Blocking, pull-based decoder for the inotify record stream.
///
/// Owns a [`SlidingBuffer`] and a [`ByteSource`]. Each call to
/// [`next_event`](Self::next_event) produces exactly one record, pulling
/// from the source only when the buffer does not already hold it:
///
///   1. **Header**: while fewer than 16 bytes are buffered, compact the
///      buffer if anything was consumed, then read into the free tail.
///      Short reads loop; they are never mistaken for a full record.
///   2. **Bounds**: reject a header whose record could never fit in the
///      buffer ([`DecodeError::RecordTooLarge`]).
///   3. **Payload**: run the same compact/fill loop until the whole
///      announced payload is buffered, so a name split across two reads
///      is reassembled rather than read past the filled cursor.
///   4. **Extract**: copy the header fields and NUL-truncated name out
///      into an owned [`Event`] and advance past the record.
///
/// End of stream and errors are terminal and sticky: once either has been
/// returned, later calls return the same result without reading again.
///
/// # Example
///
/// ```rust
/// use inwatch_decoder::EventDecoder;
/// use inwatch_wire::{encode_record, EventMask};
///
/// let bytes = encode_record(3, EventMask::CREATE, 0, Some("a.txt")).unwrap();
/// let mut decoder = EventDecoder::new(bytes.as_slice()).unwrap();
///
/// let event = decoder.next_event().unwrap().unwrap();
/// assert_eq!(event.wd, 3);
/// assert_eq!(event.name(), Some("a.txt"));
/// assert!(decoder.next_event().unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct EventDecoder<S> {
    source: S,
    buffer: SlidingBuffer,
    session: Session,
}

impl<S: ByteSource> EventDecoder<S> {
    /// Create a decoder with the default configuration.
    ///
    /// # Errors
    ///
    /// Infallible with the default capacity; the `Result` matches
    /// [`with_config`](Self::with_config).
    pub fn new(source: S) -> Result<Self, DecodeError> {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Create a decoder with a buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Configuration`] if `capacity` is smaller than
    /// one record header.
    pub fn with_capacity(source: S, capacity: usize) -> Result<Self, DecodeError> {
        Self::with_config(source, DecoderConfig::with_capacity(capacity))
    }

    /// Create a decoder from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Configuration`] if the configured capacity is
    /// smaller than one record header.
    pub fn with_config(source: S, config: DecoderConfig) -> Result<Self, DecodeError> {
        config.validate()?;
        Ok(Self {
            source,
            buffer: SlidingBuffer::new(config.buffer_capacity),
            session: Session::Ready,
        })
    }

    /// Decode the next event.
    ///
    /// Returns `Ok(Some(event))` for each record, `Ok(None)` once the
    /// source reports end of stream, or `Err` if the source fails or the
    /// stream announces a record the buffer cannot hold.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::Io`] if the source read fails.
    /// - [`DecodeError::RecordTooLarge`] if a header's payload length
    ///   exceeds what the buffer can hold.
    pub fn next_event(&mut self) -> Result<Option<Event>, DecodeError> {
        if let Some(result) = self.session.terminal() {
            return result;
        }
        let outcome = self.decode_record();
        self.session.settle(&self.buffer, outcome)
    }

    /// Iterate over the remaining events.
    ///
    /// The iterator ends after end of stream, or after yielding the first
    /// error.
    pub fn events(&mut self) -> Events<'_, S> {
        Events {
            decoder: self,
            done: false,
        }
    }

    fn decode_record(&mut self) -> Result<Option<Event>, DecodeError> {
        if !self.fill_to(HEADER_SIZE)? {
            return Ok(None);
        }

        let header = self.buffer.peek_header()?;
        let record_len = self.buffer.check_record(&header)?;

        if !self.fill_to(record_len)? {
            return Ok(None);
        }

        Ok(Some(self.buffer.take_record(&header)))
    }

    /// Read until at least `want` bytes are buffered.
    ///
    /// Returns `Ok(false)` if the source reached end of stream first.
    fn fill_to(&mut self, want: usize) -> Result<bool, DecodeError> {
        while let Some(spare) = self.buffer.reserve_for(want) {
            match self.source.read_bytes(spare) {
                Ok(0) => return Ok(false),
                Ok(n) => self.buffer.commit(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(true)
    }
}

impl<S> EventDecoder<S> {
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Bytes read from the source but not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.buffered()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give up the decoder and return its source. Buffered, undecoded
    /// bytes are dropped.
    pub fn into_source(self) -> S {
        self.source
    }
}

/// Iterator returned by [`EventDecoder::events`].
pub struct Events<'a, S> {
    decoder: &'a mut EventDecoder<S>,
    done: bool,
}

impl<S: ByteSource> Iterator for Events<'_, S> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decoder.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inwatch_wire::{EventMask, RecordBuilder, encode_record};

    /// Hands out at most `chunk` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        chunk: usize,
        reads: usize,
    }

    impl io::Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            let n = self.chunk.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    /// Fails with the given kind on the first read, then succeeds.
    struct FailOnce<R> {
        inner: R,
        kind: Option<io::ErrorKind>,
    }

    impl<R: io::Read> io::Read for FailOnce<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.kind.take() {
                Some(kind) => Err(io::Error::new(kind, "injected")),
                None => self.inner.read(buf),
            }
        }
    }

    #[test]
    fn decodes_records_in_order() {
        let mut stream = encode_record(1, EventMask::CREATE, 0, Some("one")).unwrap();
        stream.extend(encode_record(1, EventMask::MODIFY, 0, Some("two")).unwrap());
        stream.extend(encode_record(2, EventMask::DELETE_SELF, 0, None).unwrap());

        let mut decoder = EventDecoder::new(stream.as_slice()).unwrap();
        let names: Vec<_> = decoder
            .events()
            .map(|e| e.unwrap().name)
            .collect();
        assert_eq!(names, vec![Some("one".into()), Some("two".into()), None]);
        assert_eq!(decoder.state(), SessionState::EndOfStream);
    }

    #[test]
    fn single_byte_reads() {
        let stream = RecordBuilder::new(3, EventMask::CREATE)
            .cookie(5)
            .name("a.txt")
            .to_bytes()
            .unwrap();
        let source = Trickle {
            data: &stream,
            chunk: 1,
            reads: 0,
        };
        let mut decoder = EventDecoder::with_capacity(source, 64).unwrap();

        let event = decoder.next_event().unwrap().unwrap();
        assert_eq!(event.wd, 3);
        assert_eq!(event.cookie, 5);
        assert_eq!(event.name(), Some("a.txt"));
        assert_eq!(decoder.source().reads, stream.len());
    }

    #[test]
    fn end_of_stream_is_sticky() {
        let source = Trickle {
            data: &[],
            chunk: 8,
            reads: 0,
        };
        let mut decoder = EventDecoder::with_capacity(source, 64).unwrap();
        assert!(decoder.next_event().unwrap().is_none());
        assert!(decoder.next_event().unwrap().is_none());
        assert_eq!(decoder.source().reads, 1);
    }

    #[test]
    fn failure_is_sticky() {
        let source = FailOnce {
            inner: io::empty(),
            kind: Some(io::ErrorKind::BrokenPipe),
        };
        let mut decoder = EventDecoder::new(source).unwrap();
        let first = decoder.next_event().unwrap_err();
        assert_eq!(first.io_kind(), Some(io::ErrorKind::BrokenPipe));
        assert_eq!(decoder.state(), SessionState::Failed);

        // The source would now succeed with end of stream; the decoder
        // must not ask it.
        let second = decoder.next_event().unwrap_err();
        assert_eq!(second.io_kind(), Some(io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let stream = encode_record(9, EventMask::OPEN, 0, None).unwrap();
        let source = FailOnce {
            inner: stream.as_slice(),
            kind: Some(io::ErrorKind::Interrupted),
        };
        let mut decoder = EventDecoder::new(source).unwrap();
        assert_eq!(decoder.next_event().unwrap().unwrap().wd, 9);
    }

    #[test]
    fn rejects_buffer_smaller_than_header() {
        let err = EventDecoder::with_capacity(io::empty(), 8).unwrap_err();
        assert!(matches!(err, DecodeError::Configuration { capacity: 8, .. }));
    }

    #[test]
    fn oversized_record_fails_the_session() {
        let stream = RecordBuilder::new(1, EventMask::CREATE)
            .name("a-name-long-enough-to-overflow")
            .to_bytes()
            .unwrap();
        let mut decoder = EventDecoder::with_capacity(stream.as_slice(), 32).unwrap();
        let err = decoder.next_event().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::RecordTooLarge {
                record_len: 48,
                capacity: 32,
                offset: 0
            }
        ));
        assert!(matches!(
            decoder.next_event(),
            Err(DecodeError::RecordTooLarge { .. })
        ));
    }

    #[test]
    fn truncated_payload_ends_the_stream() {
        let stream = encode_record(1, EventMask::CREATE, 0, Some("cut")).unwrap();
        let truncated = &stream[..stream.len() - 4];
        let mut decoder = EventDecoder::new(truncated).unwrap();
        assert!(decoder.next_event().unwrap().is_none());
        assert_eq!(decoder.buffered(), truncated.len());
    }

    #[test]
    fn events_iterator_stops_after_error() {
        let source = FailOnce {
            inner: io::empty(),
            kind: Some(io::ErrorKind::Other),
        };
        let mut decoder = EventDecoder::new(source).unwrap();
        let results: Vec<_> = decoder.events().collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
