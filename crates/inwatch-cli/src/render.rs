/// Text formatting shared by the subcommands.
///
/// ```text
/// [0x00000100]: /tmp // a.txt (CREATE)
/// [0x40000100]: wd=1 // sub (CREATE|ISDIR)
/// [0x00008000]: /tmp (IGNORED)
/// ```
use std::fmt::{self, Write as _};

use inwatch_decoder::Event;
use inwatch_wire::EventHeader;

/// One line per delivered event. `origin` is the watched path, or
/// `wd=N` when no path is known.
pub fn event_line(origin: impl fmt::Display, event: &Event) -> String {
    let mut line = format!("[{:#010x}]: {origin}", event.mask.raw());
    if let Some(name) = event.name() {
        let _ = write!(line, " // {name}");
    }
    if event.cookie != 0 {
        let _ = write!(line, " cookie={}", event.cookie);
    }
    let _ = write!(line, " ({})", event.mask);
    line
}

/// Header summary used by `inspect`.
pub fn header_line(offset: usize, header: &EventHeader) -> String {
    format!(
        "{offset:08x}  wd={} mask={:#010x} ({}) cookie={} len={}",
        header.wd,
        header.mask.raw(),
        header.mask,
        header.cookie,
        header.len
    )
}

/// 16-byte-per-line hex and ASCII dump, offsets relative to `base`.
pub fn hex_dump(bytes: &[u8], base: usize) -> Vec<String> {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let offset = base + i * 16;
            let hex: String = chunk
                .iter()
                .fold(String::with_capacity(chunk.len() * 3), |mut s, b| {
                    if !s.is_empty() {
                        s.push(' ');
                    }
                    let _ = write!(s, "{b:02x}");
                    s
                });
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            format!("{offset:08x}  {hex:<47}  {ascii}")
        })
        .collect()
}
