/// Implementation of `inwatch inspect`.
///
/// Walks a captured stream record by record without the sliding buffer,
/// printing where each record starts and what its header says. Useful for
/// checking a capture that the decoder rejects.
///
/// # Output format
///
/// ```text
/// 00000000  wd=1 mask=0x00000100 (CREATE) cookie=0 len=16
///           name: "a.txt"
/// 00000020  wd=1 mask=0x00000200 (DELETE) cookie=0 len=16
///           name: "a.txt"
/// ---
/// 2 records, 64 bytes
/// ```
use std::fs;

use anyhow::{Context, Result};
use inwatch_decoder::Event;
use inwatch_wire::{EventHeader, HEADER_SIZE};

use crate::InspectArgs;
use crate::render;

/// Run the `inwatch inspect` command.
///
/// A truncated trailing record is reported, not treated as an error,
/// since captures cut short by `--count` or a kill routinely end that way.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn run(args: &InspectArgs) -> Result<()> {
    let bytes =
        fs::read(&args.file).with_context(|| format!("cannot read {}", args.file.display()))?;

    let mut offset = 0usize;
    let mut records = 0usize;

    while offset < bytes.len() {
        let rest = &bytes[offset..];
        if rest.len() < HEADER_SIZE {
            println!("{offset:08x}  truncated header ({} of {HEADER_SIZE} bytes)", rest.len());
            break;
        }
        let header = EventHeader::read_from(rest)
            .with_context(|| format!("bad header at offset {offset}"))?;
        println!("{}", render::header_line(offset, &header));

        let record_len = header.record_len();
        if rest.len() < record_len {
            println!(
                "          truncated payload ({} of {} bytes)",
                rest.len() - HEADER_SIZE,
                header.len
            );
            break;
        }

        let record = &rest[..record_len];
        let event = Event::from_parts(&header, &record[HEADER_SIZE..]);
        if let Some(name) = event.name() {
            println!("          name: {name:?}");
        }
        if args.show_hex {
            for line in render::hex_dump(record, offset) {
                println!("          {line}");
            }
        }

        offset += record_len;
        records += 1;
    }

    println!("---");
    println!(
        "{records} record{}, {} bytes",
        if records == 1 { "" } else { "s" },
        bytes.len()
    );
    Ok(())
}
