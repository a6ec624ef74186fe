#![warn(clippy::pedantic)]

//! Watch registration and listener dispatch on top of the event decoder.
//!
//! [`Inotify`] (Linux only) owns the kernel descriptor and is both a byte
//! source for the decoder and a [`WatchRegistry`]. [`Dispatcher`] maps
//! the watch descriptors in decoded events back to the subscriptions
//! that asked for them.

pub mod config;
pub mod dispatch;
pub mod error;
#[cfg(target_os = "linux")]
pub mod inotify;
pub mod registry;

pub use config::WatcherConfig;
pub use dispatch::{Dispatcher, EventListener, SubscriptionId};
pub use error::WatchError;
#[cfg(target_os = "linux")]
pub use inotify::{InitFlags, Inotify, Watcher};
pub use registry::{WatchDescriptor, WatchRegistry};
