#![no_main]

use libfuzzer_sys::fuzz_target;
use inwatch_wire::{EventHeader, HEADER_SIZE};

// Fuzz target: EventHeader::read_from on arbitrary bytes.
//
// Short input must be rejected, anything else must parse, and writing the
// parsed header back must reproduce the first 16 bytes.
fuzz_target!(|data: &[u8]| {
    match EventHeader::read_from(data) {
        Ok(header) => {
            assert!(data.len() >= HEADER_SIZE);
            let mut out = [0u8; HEADER_SIZE];
            header.write_to(&mut out).unwrap();
            assert_eq!(&out[..], &data[..HEADER_SIZE]);
        }
        Err(_) => assert!(data.len() < HEADER_SIZE),
    }
});
