use std::io;

/// A blocking, ordered, lossless byte stream the decoder pulls from.
///
/// `read_bytes` fills some prefix of `buf` and returns how many bytes it
/// wrote. `Ok(0)` means orderly end of stream. Short reads are normal and
/// carry no framing meaning: record boundaries are imposed entirely by
/// the decoder.
///
/// Every [`std::io::Read`] is a `ByteSource`, so files, pipes, cursors
/// and the inotify handle in `inwatch-watch` all plug in directly.
pub trait ByteSource {
    /// Pull up to `buf.len()` bytes.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying stream. `ErrorKind::Interrupted`
    /// is retried by the decoder; anything else fails the session.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: io::Read + ?Sized> ByteSource for R {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}
