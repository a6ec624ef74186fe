#![no_main]

use libfuzzer_sys::fuzz_target;
use inwatch_wire::EventMask;

// Fuzz target: EventMask name parsing.
//
// Parsing must never panic, and a parsed mask with only named bits must
// survive Display -> FromStr unchanged.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(mask) = text.parse::<EventMask>() {
        if mask.unnamed_bits() == 0 && !mask.is_empty() {
            let again: EventMask = mask.to_string().parse().unwrap();
            assert_eq!(again, mask);
        }
    }
});
