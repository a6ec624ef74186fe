/// Implementation of `inwatch decode`.
///
/// Feeds a captured stream through the sliding-buffer decoder and prints
/// one line per event. `--chunk N` caps every read at N bytes so records
/// arrive split across reads, which is how a short-read kernel or pipe
/// would deliver them.
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};

use anyhow::{Context, Result};
use inwatch_decoder::{DecoderConfig, EventDecoder};

use crate::DecodeArgs;
use crate::render;

/// Run the `inwatch decode` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the buffer size is
/// invalid, or the stream is undecodable.
pub fn run(args: &DecodeArgs) -> Result<()> {
    let file =
        File::open(&args.file).with_context(|| format!("cannot open {}", args.file.display()))?;

    let source: Box<dyn Read> = match args.chunk {
        Some(0) => anyhow::bail!("--chunk must be at least 1"),
        Some(limit) => Box::new(ChunkedReader { inner: file, limit }),
        None => Box::new(file),
    };

    let config = DecoderConfig::with_capacity(args.buffer_size);
    let mut decoder = EventDecoder::with_config(source, config)
        .with_context(|| format!("invalid --buffer-size {}", args.buffer_size))?;

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let mut count = 0usize;
    for event in decoder.events() {
        let event = event.with_context(|| format!("failed to decode {}", args.file.display()))?;
        if args.json {
            serde_json::to_writer(&mut out, &event)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", render::event_line(format_args!("wd={}", event.wd), &event))?;
        }
        count += 1;
    }
    out.flush()?;

    tracing::info!(events = count, file = %args.file.display(), "decoded");
    Ok(())
}

// ── Partial delivery ──────────────────────────────────────────────────────────

/// Reader that returns at most `limit` bytes per call.
struct ChunkedReader<R> {
    inner: R,
    limit: usize,
}

impl<R: Read> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.limit);
        self.inner.read(&mut buf[..n])
    }
}
