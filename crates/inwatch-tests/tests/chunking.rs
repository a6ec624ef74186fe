//! Property tests: how the source splits the stream must not matter.
//!
//! The kernel may hand back any prefix of the pending records, and pipes
//! or replayed captures can cut through headers and names alike. These
//! properties feed the same records through arbitrary read sizes and
//! buffer capacities and require the exact same events, in order,
//! followed by end of stream.

use std::io::Cursor;

use inwatch_decoder::{Event, EventDecoder, SessionState};
use inwatch_tests::{ChunkedSource, CountingSource, mixed_stream};
use inwatch_wire::MIN_BUFFER_SIZE;
use quickcheck::{QuickCheck, TestResult};

fn decode_all<S: inwatch_decoder::ByteSource>(decoder: &mut EventDecoder<S>) -> Vec<Event> {
    decoder.events().map(Result::unwrap).collect()
}

/// Property: any sequence of read sizes yields the same events as one
/// unbroken read.
#[test]
fn partial_delivery_invariance_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(count: u8, sizes: Vec<usize>, extra_capacity: u16) -> TestResult {
        let fixture = mixed_stream(usize::from(count % 48) + 1);
        let sizes: Vec<usize> = sizes.iter().map(|s| 1 + s % 97).collect();
        if sizes.is_empty() {
            return TestResult::discard();
        }

        let capacity = MIN_BUFFER_SIZE + usize::from(extra_capacity % 4096);
        let source = ChunkedSource::new(fixture.bytes, &sizes);
        let mut decoder = EventDecoder::with_capacity(source, capacity).unwrap();

        let events = decode_all(&mut decoder);
        TestResult::from_bool(
            events == fixture.events
                && decoder.state() == SessionState::EndOfStream
                && decoder.source().remaining() == 0,
        )
    }

    QuickCheck::new()
        .tests(500)
        .quickcheck(prop as fn(u8, Vec<usize>, u16) -> TestResult);
}

/// Property: the decoder never asks for more than its capacity and every
/// byte of the stream is read exactly once.
#[test]
fn no_byte_lost_or_reread_quickcheck() {
    fn prop(count: u8, chunk: u8) -> bool {
        let fixture = mixed_stream(usize::from(count % 32) + 1);
        let total = fixture.bytes.len();
        let source = CountingSource::new(ChunkedSource::uniform(
            fixture.bytes,
            usize::from(chunk) + 1,
        ));
        let mut decoder = EventDecoder::with_capacity(source, MIN_BUFFER_SIZE).unwrap();

        let events = decode_all(&mut decoder);
        let counted = decoder.source();
        events == fixture.events
            && counted.bytes == total
            && counted.widest_request <= MIN_BUFFER_SIZE
    }

    QuickCheck::new()
        .tests(300)
        .quickcheck(prop as fn(u8, u8) -> bool);
}

#[test]
fn one_byte_reads() {
    let fixture = mixed_stream(25);
    let mut decoder =
        EventDecoder::with_capacity(ChunkedSource::uniform(fixture.bytes, 1), MIN_BUFFER_SIZE)
            .unwrap();
    assert_eq!(decode_all(&mut decoder), fixture.events);
}

#[test]
fn whole_stream_in_one_read() {
    let fixture = mixed_stream(25);
    let capacity = fixture.bytes.len();
    let mut decoder = EventDecoder::with_capacity(
        CountingSource::new(Cursor::new(fixture.bytes)),
        capacity,
    )
    .unwrap();

    assert_eq!(decode_all(&mut decoder), fixture.events);
    // One read for everything, one more to see end of stream.
    assert_eq!(decoder.source().reads, 2);
}

#[test]
fn sequencing_ends_with_end_of_stream() {
    let fixture = mixed_stream(10);
    let mut decoder = EventDecoder::new(Cursor::new(fixture.bytes)).unwrap();
    for expected in &fixture.events {
        assert_eq!(decoder.next_event().unwrap().as_ref(), Some(expected));
    }
    assert_eq!(decoder.next_event().unwrap(), None);
}
