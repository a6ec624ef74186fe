use inwatch_wire::{EventHeader, EventMask};

/// One decoded filesystem-change record.
///
/// Owns all of its data: nothing here borrows from the decoder's buffer,
/// so an `Event` stays valid after the buffer region it came from has been
/// compacted away.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Event {
    /// Watch descriptor of the watch that produced the event.
    pub wd: i32,

    /// Event bits exactly as the kernel reported them.
    pub mask: EventMask,

    /// Pairs a `MOVED_FROM` with its `MOVED_TO`; zero otherwise.
    pub cookie: u32,

    /// Name of the entry inside a watched directory. `None` when the
    /// record carried no payload (events on the watched path itself).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl Event {
    /// Build an event from a parsed header and the `header.len` payload
    /// bytes that follow it.
    ///
    /// The name is everything up to the first NUL, or the whole payload if
    /// it has none. Bytes that are not valid UTF-8 become U+FFFD.
    #[must_use]
    pub fn from_parts(header: &EventHeader, payload: &[u8]) -> Self {
        let name = (header.len > 0).then(|| {
            let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
            String::from_utf8_lossy(&payload[..end]).into_owned()
        });

        Self {
            wd: header.wd,
            mask: header.mask,
            cookie: header.cookie,
            name,
        }
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.mask.is_dir()
    }
}
