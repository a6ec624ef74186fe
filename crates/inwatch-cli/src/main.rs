/// inwatch command-line tool: watch paths, capture raw inotify streams,
/// and decode or inspect captured streams offline.
///
/// # Command overview
///
/// ```text
/// inwatch <COMMAND> [OPTIONS]
///
/// Commands:
///   watch      Subscribe to paths and print events as they arrive
///   capture    Write the raw inotify record stream to a file
///   decode     Decode a captured stream and print its events
///   inspect    Print the record layout of a captured stream
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Raise log verbosity (-v info, -vv debug, -vvv trace)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// `RUST_LOG` overrides `-v` when set.
///
/// # Exit codes
///
/// | Code | Meaning                                        |
/// |------|------------------------------------------------|
/// | 0    | Success                                        |
/// | 1    | Error (I/O failure, undecodable stream, etc.)  |
///
/// Logs and errors go to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use inwatch_wire::EventMask;
use tracing_subscriber::EnvFilter;

#[cfg(target_os = "linux")]
mod cmd_capture;
mod cmd_decode;
mod cmd_inspect;
#[cfg(target_os = "linux")]
mod cmd_watch;
mod render;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Filesystem change notifications from the inotify event stream.
#[derive(Parser)]
#[command(name = "inwatch", version, about = "inotify event stream tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raise log verbosity; repeat for more.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Subscribe to paths and print events as they arrive.
    Watch(WatchArgs),
    /// Write the raw inotify record stream to a file.
    Capture(CaptureArgs),
    /// Decode a captured stream and print its events.
    Decode(DecodeArgs),
    /// Print record offsets, headers and optionally a hex dump.
    Inspect(InspectArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `inwatch watch`.
///
/// ```text
/// ┌───────────────┬──────────────────────────────────────────────────────┐
/// │ Flag          │ Effect                                               │
/// ├───────────────┼──────────────────────────────────────────────────────┤
/// │ --events      │ Event names, comma or `|` separated                  │
/// │ --buffer-size │ Decoder buffer capacity in bytes                     │
/// │ --count N     │ Exit after N deliveries (default: run until killed)  │
/// └───────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct WatchArgs {
    /// Paths to watch.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Events to subscribe to, e.g. `create,delete,close_write` or `all`.
    #[arg(long, default_value = "create,delete,close_write")]
    pub events: EventMask,

    /// Decoder buffer capacity in bytes.
    #[arg(long, default_value_t = inwatch_decoder::DEFAULT_BUFFER_CAPACITY)]
    pub buffer_size: usize,

    /// Stop after this many events have been printed.
    #[arg(long)]
    pub count: Option<usize>,
}

/// Arguments for `inwatch capture`.
///
/// The capture holds whole kernel reads, so it may end a few records past
/// `--count`.
#[derive(clap::Args)]
pub struct CaptureArgs {
    /// Paths to watch.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// File that receives the raw record stream.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Events to subscribe to.
    #[arg(long, default_value = "all")]
    pub events: EventMask,

    /// Stop after this many records have been read.
    #[arg(long)]
    pub count: Option<usize>,
}

/// Arguments for `inwatch decode`.
///
/// ```text
/// ┌───────────────┬──────────────────────────────────────────────────────┐
/// │ Flag          │ Effect                                               │
/// ├───────────────┼──────────────────────────────────────────────────────┤
/// │ --buffer-size │ Decoder buffer capacity in bytes                     │
/// │ --chunk N     │ Hand the decoder at most N bytes per read            │
/// │ --json        │ One JSON object per event instead of text lines      │
/// │ -o / --output │ Write to file instead of stdout                      │
/// └───────────────┴──────────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Captured stream to decode.
    pub file: PathBuf,

    /// Decoder buffer capacity in bytes.
    #[arg(long, default_value_t = inwatch_decoder::DEFAULT_BUFFER_CAPACITY)]
    pub buffer_size: usize,

    /// Limit every read to this many bytes, to exercise partial delivery.
    #[arg(long)]
    pub chunk: Option<usize>,

    /// Emit JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Write output to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `inwatch inspect`.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Captured stream to inspect.
    pub file: PathBuf,

    /// Show a 16-byte-per-line hex dump of every record.
    #[arg(long)]
    pub show_hex: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(not(target_os = "linux"))]
fn linux_only(command: &str) -> anyhow::Result<()> {
    anyhow::bail!("`{command}` needs inotify, which is only available on Linux")
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        #[cfg(target_os = "linux")]
        Commands::Watch(args) => cmd_watch::run(&args),
        #[cfg(target_os = "linux")]
        Commands::Capture(args) => cmd_capture::run(&args),
        #[cfg(not(target_os = "linux"))]
        Commands::Watch(_) => linux_only("watch"),
        #[cfg(not(target_os = "linux"))]
        Commands::Capture(_) => linux_only("capture"),
        Commands::Decode(args) => cmd_decode::run(&args),
        Commands::Inspect(args) => cmd_inspect::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
