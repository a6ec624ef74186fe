/// Implementation of `inwatch watch`.
///
/// Subscribes one listener per path and prints every delivery:
///
/// ```text
/// [0x00000100]: /tmp // a.txt (CREATE)
/// [0x00000008]: /tmp // a.txt (CLOSE_WRITE)
/// [0x00000200]: /tmp // a.txt (DELETE)
/// ```
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use inwatch_decoder::{DecoderConfig, Event};
use inwatch_watch::{Watcher, WatcherConfig};

use crate::WatchArgs;
use crate::render;

/// Run the `inwatch watch` command.
///
/// # Errors
///
/// Returns an error if the inotify instance cannot be opened, a path
/// cannot be watched, or the event stream fails.
pub fn run(args: &WatchArgs) -> Result<()> {
    let config = WatcherConfig {
        decoder: DecoderConfig::with_capacity(args.buffer_size),
        ..WatcherConfig::default()
    };
    let mut watcher = Watcher::open(config).context("cannot start watcher")?;

    let printed = Rc::new(Cell::new(0usize));
    for path in &args.paths {
        let printed = Rc::clone(&printed);
        watcher
            .subscribe(path, args.events, move |path: &Path, event: &Event| {
                println!("{}", render::event_line(path.display(), event));
                printed.set(printed.get() + 1);
            })
            .with_context(|| format!("cannot watch {}", path.display()))?;
    }
    tracing::info!(paths = args.paths.len(), events = %args.events, "watching");

    while args.count.is_none_or(|limit| printed.get() < limit) {
        if !watcher.dispatch_next().context("event stream failed")? {
            break;
        }
        if watcher.subscription_count() == 0 {
            tracing::info!("all watches removed");
            break;
        }
    }
    Ok(())
}
