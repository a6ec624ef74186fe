/// Implementation of `inwatch capture`.
///
/// Records the raw byte stream read from an inotify instance so it can be
/// replayed later with `decode` or `inspect`. The decoder runs on the same
/// bytes to count records and to stop on a malformed stream.
use std::fs::File;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use inwatch_decoder::EventDecoder;
use inwatch_watch::{InitFlags, Inotify};

use crate::CaptureArgs;

/// Run the `inwatch capture` command.
///
/// # Errors
///
/// Returns an error if the output file cannot be created, a path cannot
/// be watched, or reading from the kernel fails.
pub fn run(args: &CaptureArgs) -> Result<()> {
    let inotify = Inotify::init(InitFlags::CLOEXEC).context("cannot start inotify")?;
    for path in &args.paths {
        let wd = inotify
            .add_watch(path, args.events)
            .with_context(|| format!("cannot watch {}", path.display()))?;
        tracing::debug!(%wd, path = %path.display(), "watch added");
    }

    let out = File::create(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;
    let tee = Tee {
        inner: inotify,
        out,
        written: 0,
    };
    let mut decoder = EventDecoder::new(tee)?;

    let mut records = 0usize;
    while args.count.is_none_or(|limit| records < limit) {
        match decoder.next_event().context("event stream failed")? {
            Some(event) => {
                tracing::trace!(wd = event.wd, mask = %event.mask, "captured");
                records += 1;
            }
            None => break,
        }
    }

    let tee = decoder.into_source();
    tracing::info!(
        records,
        bytes = tee.written,
        file = %args.output.display(),
        "capture finished"
    );
    Ok(())
}

// ── Capture plumbing ──────────────────────────────────────────────────────────

/// Copies every byte read from `inner` into `out`.
struct Tee<R, W> {
    inner: R,
    out: W,
    written: u64,
}

impl<R: Read, W: Write> Read for Tee<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.out.write_all(&buf[..n])?;
        self.written += n as u64;
        Ok(n)
    }
}
