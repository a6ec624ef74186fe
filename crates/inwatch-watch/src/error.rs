use std::io;
use std::path::PathBuf;

use inwatch_decoder::DecodeError;

use crate::dispatch::SubscriptionId;
use crate::registry::WatchDescriptor;

/// Errors from watch registration and event dispatch.
///
/// ```text
///   WatchError
///   ├── Init                 ← inotify_init1 failed
///   ├── AddWatch             ← inotify_add_watch failed for a path
///   ├── RemoveWatch          ← inotify_rm_watch failed for a descriptor
///   ├── InvalidPath          ← path contains an interior NUL byte
///   ├── AlreadyCancelled     ← subscription was cancelled before
///   ├── UnknownSubscription  ← id was never issued by this dispatcher
///   └── Decode(DecodeError)  ← from the event stream
/// ```
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("cannot create inotify instance")]
    Init(#[source] io::Error),

    #[error("cannot watch {}", path.display())]
    AddWatch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot remove watch {wd}")]
    RemoveWatch {
        wd: WatchDescriptor,
        #[source]
        source: io::Error,
    },

    #[error("path {} contains a NUL byte", path.display())]
    InvalidPath { path: PathBuf },

    #[error("subscription {id} was already cancelled")]
    AlreadyCancelled { id: SubscriptionId },

    #[error("subscription {id} does not belong to this dispatcher")]
    UnknownSubscription { id: SubscriptionId },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
