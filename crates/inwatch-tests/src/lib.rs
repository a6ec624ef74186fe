#![warn(clippy::pedantic)]

//! Shared fixtures for the integration tests and benches.
//!
//! The sources here stand in for a kernel descriptor: they control how
//! many bytes each read returns, count how often they are read, and fail
//! on demand.

use std::io::{self, Read};

use inwatch_decoder::Event;
use inwatch_wire::{EventMask, RecordBuilder};

// ── Sources ───────────────────────────────────────────────────────────────────

/// Delivers a byte stream in reads of the given sizes.
///
/// Sizes are used in order and the last one repeats. A size larger than
/// the caller's buffer is clamped to the buffer.
pub struct ChunkedSource {
    data: Vec<u8>,
    pos: usize,
    sizes: Vec<usize>,
    next: usize,
}

impl ChunkedSource {
    /// # Panics
    ///
    /// If `sizes` is empty or contains a zero, which would read as end of
    /// stream.
    #[must_use]
    pub fn new(data: Vec<u8>, sizes: &[usize]) -> Self {
        assert!(!sizes.is_empty(), "need at least one chunk size");
        assert!(sizes.iter().all(|&s| s > 0), "a zero-sized read means end of stream");
        Self {
            data,
            pos: 0,
            sizes: sizes.to_vec(),
            next: 0,
        }
    }

    /// Every read returns at most `size` bytes.
    #[must_use]
    pub fn uniform(data: Vec<u8>, size: usize) -> Self {
        Self::new(data, &[size])
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl Read for ChunkedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let size = self.sizes[self.next.min(self.sizes.len() - 1)];
        self.next += 1;
        let n = size.min(buf.len()).min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Counts the reads and bytes that pass through it.
pub struct CountingSource<R> {
    inner: R,
    pub reads: usize,
    pub bytes: usize,
    /// Largest buffer a caller offered in a single read.
    pub widest_request: usize,
}

impl<R> CountingSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            reads: 0,
            bytes: 0,
            widest_request: 0,
        }
    }
}

impl<R: Read> Read for CountingSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        self.widest_request = self.widest_request.max(buf.len());
        let n = self.inner.read(buf)?;
        self.bytes += n;
        Ok(n)
    }
}

/// Serves `data`, then fails every read with `kind`.
pub struct FailingSource {
    data: io::Cursor<Vec<u8>>,
    kind: io::ErrorKind,
    pub failures: usize,
}

impl FailingSource {
    #[must_use]
    pub fn new(data: Vec<u8>, kind: io::ErrorKind) -> Self {
        Self {
            data: io::Cursor::new(data),
            kind,
            failures: 0,
        }
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.data.read(buf)?;
        if n > 0 {
            return Ok(n);
        }
        self.failures += 1;
        Err(io::Error::new(self.kind, "source failed"))
    }
}

// ── Streams ───────────────────────────────────────────────────────────────────

/// A record and the event the decoder must produce for it.
pub struct Fixture {
    pub bytes: Vec<u8>,
    pub events: Vec<Event>,
}

impl Fixture {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Append one kernel-aligned record.
    ///
    /// # Panics
    ///
    /// If the name is too long to encode.
    #[must_use]
    pub fn record(mut self, wd: i32, mask: EventMask, cookie: u32, name: Option<&str>) -> Self {
        let mut builder = RecordBuilder::new(wd, mask).cookie(cookie);
        if let Some(name) = name {
            builder = builder.name(name);
        }
        builder.write_to(&mut self.bytes).unwrap();
        self.events.push(Event {
            wd,
            mask,
            cookie,
            name: name.map(str::to_string),
        });
        self
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A deterministic mix of `count` records: nameless self events, short and
/// long names, directory flags, and cookie-paired moves.
#[must_use]
pub fn mixed_stream(count: usize) -> Fixture {
    const MASKS: [EventMask; 6] = [
        EventMask::CREATE,
        EventMask::MODIFY,
        EventMask::CLOSE_WRITE,
        EventMask::DELETE,
        EventMask::ATTRIB,
        EventMask::DELETE_SELF,
    ];

    let mut fixture = Fixture::new();
    let mut i = 0;
    while fixture.events.len() < count {
        let wd = i32::try_from(i % 7).unwrap_or(0) + 1;
        match i % 5 {
            0 => fixture = fixture.record(wd, MASKS[5], 0, None),
            1 => {
                let name = format!("f{i}");
                fixture = fixture.record(wd, MASKS[i % 5], 0, Some(&name));
            }
            2 => {
                let name = "n".repeat(1 + (i * 37) % 200);
                fixture = fixture.record(wd, MASKS[i % 4] | EventMask::ISDIR, 0, Some(&name));
            }
            3 if fixture.events.len() + 2 <= count => {
                let cookie = u32::try_from(i).unwrap_or(u32::MAX);
                fixture = fixture
                    .record(wd, EventMask::MOVED_FROM, cookie, Some("old"))
                    .record(wd, EventMask::MOVED_TO, cookie, Some("new"));
            }
            _ => fixture = fixture.record(wd, EventMask::OPEN, 0, Some("x")),
        }
        i += 1;
    }
    fixture
}
