use inwatch_decoder::DecoderConfig;

/// Settings for a [`Watcher`](crate::Watcher).
///
/// ```text
/// ┌───────────────┬──────────────────────────────────────────────────┐
/// │ Field         │ Purpose                                          │
/// ├───────────────┼──────────────────────────────────────────────────┤
/// │ decoder       │ Event buffer capacity                            │
/// │ nonblocking   │ Open the descriptor with IN_NONBLOCK             │
/// │ close_on_exec │ Open the descriptor with IN_CLOEXEC              │
/// └───────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// With `nonblocking` set, a read on an empty queue fails with
/// `WouldBlock`, which the decoder treats like any other source error
/// and fails the session. Only set it when the descriptor is polled
/// externally before every dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatcherConfig {
    pub decoder: DecoderConfig,
    pub nonblocking: bool,
    pub close_on_exec: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            nonblocking: false,
            close_on_exec: true,
        }
    }
}
