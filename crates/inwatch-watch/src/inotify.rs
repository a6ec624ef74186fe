use std::ffi::CString;
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use inwatch_wire::EventMask;

use crate::config::WatcherConfig;
use crate::dispatch::Dispatcher;
use crate::error::WatchError;
use crate::registry::{WatchDescriptor, WatchRegistry};

/// Flags for `inotify_init1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InitFlags(libc::c_int);

impl InitFlags {
    pub const NONE: Self = Self(0);
    pub const NONBLOCK: Self = Self(libc::IN_NONBLOCK);
    pub const CLOEXEC: Self = Self(libc::IN_CLOEXEC);

    #[must_use]
    pub fn raw(self) -> libc::c_int {
        self.0
    }
}

impl std::ops::BitOr for InitFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// An open inotify instance.
///
/// Reading from it yields the raw record stream, so it plugs straight
/// into `EventDecoder` as a byte source. The descriptor is closed when
/// the value is dropped; a thread blocked in `read` on a shared
/// reference is not woken by that, so close only from the owning thread.
#[derive(Debug)]
pub struct Inotify {
    fd: OwnedFd,
}

impl Inotify {
    /// Create a new inotify instance.
    ///
    /// # Errors
    ///
    /// [`WatchError::Init`] if the kernel refuses (per-user instance limit,
    /// descriptor limit).
    pub fn init(flags: InitFlags) -> Result<Self, WatchError> {
        // SAFETY: inotify_init1 takes no pointers.
        let fd = unsafe { libc::inotify_init1(flags.raw()) };
        if fd < 0 {
            return Err(WatchError::Init(io::Error::last_os_error()));
        }
        // SAFETY: `fd` is a freshly created descriptor nobody else owns.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        tracing::debug!(fd = fd.as_raw_fd(), "opened inotify instance");
        Ok(Self { fd })
    }

    /// Watch `path` for the events in `mask`.
    ///
    /// # Errors
    ///
    /// [`WatchError::InvalidPath`] for paths with interior NULs,
    /// [`WatchError::AddWatch`] if the kernel rejects the watch.
    pub fn add_watch(&self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, WatchError> {
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| {
            WatchError::InvalidPath {
                path: path.to_path_buf(),
            }
        })?;

        // SAFETY: `c_path` is a valid NUL-terminated string that outlives
        // the call.
        let wd = unsafe { libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), mask.raw()) };
        if wd < 0 {
            return Err(WatchError::AddWatch {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }
        Ok(WatchDescriptor::from_raw(wd))
    }

    /// Remove a watch.
    ///
    /// # Errors
    ///
    /// [`WatchError::RemoveWatch`] if `wd` is not a watch of this instance.
    pub fn rm_watch(&self, wd: WatchDescriptor) -> Result<(), WatchError> {
        // SAFETY: plain integer arguments.
        let rc = unsafe { libc::inotify_rm_watch(self.fd.as_raw_fd(), wd.raw()) };
        if rc < 0 {
            return Err(WatchError::RemoveWatch {
                wd,
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }
}

impl io::Read for &Inotify {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe { libc::read(self.fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(n as usize)
    }
}

impl io::Read for Inotify {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl WatchRegistry for Inotify {
    fn add_watch(&mut self, path: &Path, mask: EventMask) -> Result<WatchDescriptor, WatchError> {
        Inotify::add_watch(self, path, mask)
    }

    fn rm_watch(&mut self, wd: WatchDescriptor) -> Result<(), WatchError> {
        Inotify::rm_watch(self, wd)
    }
}

impl AsFd for Inotify {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}

impl AsRawFd for Inotify {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

/// A dispatcher reading from a live inotify instance.
pub type Watcher = Dispatcher<Inotify>;

impl Dispatcher<Inotify> {
    /// Open an inotify instance and wrap it in a dispatcher.
    ///
    /// # Errors
    ///
    /// [`WatchError::Init`] if the instance cannot be created, or
    /// [`WatchError::Decode`] if the decoder configuration is invalid.
    pub fn open(config: WatcherConfig) -> Result<Self, WatchError> {
        let mut flags = InitFlags::NONE;
        if config.nonblocking {
            flags = flags | InitFlags::NONBLOCK;
        }
        if config.close_on_exec {
            flags = flags | InitFlags::CLOEXEC;
        }
        Dispatcher::with_source(Inotify::init(flags)?, config.decoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn reports_create_in_watched_directory() {
        let dir = std::env::temp_dir().join(format!("inwatch-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let inotify = Inotify::init(InitFlags::CLOEXEC).unwrap();
        let wd = inotify.add_watch(&dir, EventMask::CREATE).unwrap();
        std::fs::write(dir.join("a.txt"), b"x").unwrap();

        let mut buf = [0u8; 4096];
        let n = (&inotify).read(&mut buf).unwrap();
        let header = inwatch_wire::EventHeader::read_from(&buf[..n]).unwrap();
        assert_eq!(header.wd, wd.raw());
        assert!(header.mask.contains(EventMask::CREATE));

        inotify.rm_watch(wd).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn nonblocking_read_on_empty_queue_would_block() {
        let mut inotify = Inotify::init(InitFlags::NONBLOCK | InitFlags::CLOEXEC).unwrap();
        let mut buf = [0u8; 64];
        let err = inotify.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn missing_path_is_reported() {
        let inotify = Inotify::init(InitFlags::NONE).unwrap();
        let err = inotify
            .add_watch(Path::new("/definitely/not/here"), EventMask::ALL_EVENTS)
            .unwrap_err();
        assert!(matches!(err, WatchError::AddWatch { .. }));
    }

    #[test]
    fn interior_nul_is_rejected() {
        let inotify = Inotify::init(InitFlags::NONE).unwrap();
        let err = inotify
            .add_watch(Path::new("bad\0path"), EventMask::CREATE)
            .unwrap_err();
        assert!(matches!(err, WatchError::InvalidPath { .. }));
    }
}
