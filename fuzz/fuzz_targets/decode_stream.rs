#![no_main]

use std::io::{self, Read};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use inwatch_decoder::{EventDecoder, SessionState};

// Fuzz target: EventDecoder over an arbitrary byte stream.
//
// Catches bugs in:
// - Cursor arithmetic when records straddle reads
// - Compaction with partially buffered headers
// - Oversized `len` fields
// - Terminal-state handling after errors
#[derive(Arbitrary, Debug)]
struct Input {
    capacity: u16,
    chunks: Vec<u8>,
    stream: Vec<u8>,
}

struct Chunked<'a> {
    data: &'a [u8],
    chunks: &'a [u8],
    next: usize,
}

impl Read for Chunked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let limit = match self.chunks.get(self.next % self.chunks.len().max(1)) {
            Some(&c) => usize::from(c).max(1),
            None => usize::MAX,
        };
        self.next += 1;
        let n = buf.len().min(limit).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

fuzz_target!(|input: Input| {
    let capacity = usize::from(input.capacity);
    let source = Chunked {
        data: &input.stream,
        chunks: &input.chunks,
        next: 0,
    };
    let Ok(mut decoder) = EventDecoder::with_capacity(source, capacity) else {
        assert!(capacity < 16);
        return;
    };

    let mut seen = 0usize;
    loop {
        match decoder.next_event() {
            Ok(Some(event)) => {
                seen += 1;
                assert!(event.name().map_or(true, |n| !n.contains('\0')));
                assert!(seen <= input.stream.len() / 16);
            }
            Ok(None) => {
                assert_eq!(decoder.state(), SessionState::EndOfStream);
                break;
            }
            Err(_) => {
                assert_eq!(decoder.state(), SessionState::Failed);
                assert!(decoder.next_event().is_err());
                break;
            }
        }
    }
    assert!(decoder.buffered() <= decoder.capacity());
});
