use inwatch_wire::{EventHeader, HEADER_SIZE};

use crate::error::DecodeError;
use crate::event::Event;

/// Fixed-capacity working buffer with a consumed cursor and a filled
/// cursor.
///
/// ```text
///   0            consumed              filled             capacity
///   ├──────────────┼─────────────────────┼───────────────────┤
///   │ already      │ read, not yet       │ free space for    │
///   │ decoded      │ decoded             │ the next read     │
///   └──────────────┴─────────────────────┴───────────────────┘
/// ```
///
/// Invariant: `0 <= consumed <= filled <= capacity`. Capacity is set once
/// and never changes; the only way to reclaim the decoded prefix is
/// [`compact`](Self::compact), which slides the undecoded region down to
/// offset 0.
///
/// The buffer does no I/O. Decoders ask it for free space with
/// [`reserve_for`](Self::reserve_for), read into that slice from their
/// source, and report the count back with [`commit`](Self::commit). The
/// same buffer therefore serves both the blocking and the async decoder.
#[derive(Debug)]
pub struct SlidingBuffer {
    buf: Box<[u8]>,
    consumed: usize,
    filled: usize,
    /// Stream position of `buf[0]`, for error messages.
    base_offset: u64,
}

impl SlidingBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            consumed: 0,
            filled: 0,
            base_offset: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    #[must_use]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Number of bytes read from the source but not yet decoded.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.filled - self.consumed
    }

    /// The undecoded region `[consumed, filled)`.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.consumed..self.filled]
    }

    /// Stream position of the next undecoded byte.
    #[must_use]
    pub fn stream_offset(&self) -> u64 {
        self.base_offset + self.consumed as u64
    }

    /// Move the undecoded region to the start of the buffer.
    ///
    /// Bytes in `[consumed, filled)` before the call are bit-identical to
    /// `[0, filled - consumed)` after it.
    ///
    /// # Returns
    ///
    /// How many bytes of space were reclaimed (the old `consumed`).
    pub fn compact(&mut self) -> usize {
        let reclaimed = self.consumed;
        if reclaimed == 0 {
            return 0;
        }

        let live = self.buffered();
        if live > 0 {
            self.buf.copy_within(self.consumed..self.filled, 0);
        }
        self.base_offset += reclaimed as u64;
        self.consumed = 0;
        self.filled = live;

        tracing::trace!(reclaimed, live, "compacted event buffer");
        reclaimed
    }

    /// Prepare to hold at least `want` undecoded bytes.
    ///
    /// Returns `None` when `want` bytes are already buffered. Otherwise
    /// compacts if anything has been consumed and returns the free tail
    /// `[filled, capacity)` for the caller to read into.
    ///
    /// Callers must ensure `want <= capacity`; a decoder checks that
    /// before asking, so the returned slice is never empty.
    pub fn reserve_for(&mut self, want: usize) -> Option<&mut [u8]> {
        debug_assert!(want <= self.capacity());
        if self.buffered() >= want {
            return None;
        }
        if self.consumed > 0 {
            self.compact();
        }
        Some(&mut self.buf[self.filled..])
    }

    /// Record that `n` bytes were written into the slice handed out by
    /// [`reserve_for`](Self::reserve_for).
    pub fn commit(&mut self, n: usize) {
        debug_assert!(self.filled + n <= self.capacity());
        self.filled = (self.filled + n).min(self.capacity());
        tracing::trace!(read = n, filled = self.filled, "filled event buffer");
    }

    /// Parse the header at the consumed cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Wire`] if fewer than [`HEADER_SIZE`] bytes
    /// are buffered.
    pub fn peek_header(&self) -> Result<EventHeader, DecodeError> {
        Ok(EventHeader::read_from(self.pending())?)
    }

    /// Check that the record announced by `header` can ever fit.
    ///
    /// # Returns
    ///
    /// Total record length (header plus payload).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::RecordTooLarge`] if header plus payload
    /// exceeds the capacity.
    pub fn check_record(&self, header: &EventHeader) -> Result<usize, DecodeError> {
        let record_len = header.record_len();
        if record_len > self.capacity() {
            return Err(DecodeError::RecordTooLarge {
                record_len,
                capacity: self.capacity(),
                offset: self.stream_offset(),
            });
        }
        Ok(record_len)
    }

    /// Copy the record at the consumed cursor out as an [`Event`] and
    /// advance past it.
    ///
    /// `header` must be the result of [`peek_header`](Self::peek_header)
    /// and the whole record must already be buffered.
    pub fn take_record(&mut self, header: &EventHeader) -> Event {
        let record_len = header.record_len();
        debug_assert!(self.buffered() >= record_len);

        let payload = &self.pending()[HEADER_SIZE..record_len];
        let event = Event::from_parts(header, payload);
        self.consumed += record_len;
        event
    }
}
