use std::fmt;
use std::path::Path;

use inwatch_wire::EventMask;

use crate::error::WatchError;

/// Kernel-issued handle for one watched path. Every event the watch
/// produces carries the same value in its `wd` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchDescriptor(i32);

impl WatchDescriptor {
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl fmt::Display for WatchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something that can register and remove path watches.
///
/// Implemented by [`Inotify`](crate::Inotify) on Linux. Test doubles
/// implement it together with `ByteSource` to drive a
/// [`Dispatcher`](crate::Dispatcher) without a kernel.
pub trait WatchRegistry {
    /// Start watching `path` for the events in `mask`.
    ///
    /// Watching a path that is already watched returns the existing
    /// descriptor, with its mask replaced (or extended, if `mask` carries
    /// `MASK_ADD`).
    ///
    /// # Errors
    ///
    /// [`WatchError::AddWatch`] or [`WatchError::InvalidPath`].
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, WatchError>;

    /// Stop watching. The kernel answers with an `IGNORED` event for `wd`.
    ///
    /// # Errors
    ///
    /// [`WatchError::RemoveWatch`].
    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), WatchError>;
}
