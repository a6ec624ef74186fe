use crate::error::WireError;
use crate::mask::EventMask;

/// Size of the fixed record header (`struct inotify_event` without its
/// flexible `name` member).
pub const HEADER_SIZE: usize = 16;

/// Longest file name component the kernel will report (`NAME_MAX`).
pub const NAME_MAX: usize = 255;

/// Smallest buffer guaranteed to hold any single record: one header plus
/// the longest name and its NUL terminator.
pub const MIN_BUFFER_SIZE: usize = HEADER_SIZE + NAME_MAX + 1;

/// Fixed header at the front of every record in the event stream.
///
/// ```text
/// ┌────────┬─────────┬──────────────────────────────────────────┐
/// │ Offset │ Size    │ Description                              │
/// ├────────┼─────────┼──────────────────────────────────────────┤
/// │ 0x00   │ 4 bytes │ wd: watch descriptor (i32)               │
/// │ 0x04   │ 4 bytes │ mask: event bits (u32)                   │
/// │ 0x08   │ 4 bytes │ cookie: move correlation id (u32)        │
/// │ 0x0C   │ 4 bytes │ len: trailing name bytes incl. padding   │
/// └────────┴─────────┴──────────────────────────────────────────┘
/// ```
///
/// All fields use the host's native byte order. Records are produced by
/// the local kernel on the same machine, so the layout is not portable and
/// does not need to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventHeader {
    pub wd: i32,
    pub mask: EventMask,
    pub cookie: u32,
    pub len: u32,
}

impl EventHeader {
    /// Number of bytes the whole record occupies: header plus payload.
    #[must_use]
    pub fn record_len(&self) -> usize {
        HEADER_SIZE + self.len as usize
    }

    /// Write the 16-byte header into the provided buffer.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than
    /// [`HEADER_SIZE`].
    pub fn write_to(&self, buf: &mut [u8]) -> Result<(), WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        buf[0..4].copy_from_slice(&self.wd.to_ne_bytes());
        buf[4..8].copy_from_slice(&self.mask.raw().to_ne_bytes());
        buf[8..12].copy_from_slice(&self.cookie.to_ne_bytes());
        buf[12..16].copy_from_slice(&self.len.to_ne_bytes());

        Ok(())
    }

    /// Parse a header from the first 16 bytes of the provided buffer.
    ///
    /// No field is validated: the mask is a pass-through bitfield and the
    /// watch descriptor is only meaningful to whoever registered it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnexpectedEof`] if `buf` is shorter than
    /// [`HEADER_SIZE`].
    pub fn read_from(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < HEADER_SIZE {
            return Err(WireError::UnexpectedEof { offset: buf.len() });
        }

        Ok(Self {
            wd: i32::from_ne_bytes(field(buf, 0)),
            mask: EventMask::from_raw(u32::from_ne_bytes(field(buf, 4))),
            cookie: u32::from_ne_bytes(field(buf, 8)),
            len: u32::from_ne_bytes(field(buf, 12)),
        })
    }
}

/// Copy the 4-byte field at `at`. Callers have already checked the length.
fn field(buf: &[u8], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_header() {
        let header = EventHeader {
            wd: 7,
            mask: EventMask::CREATE | EventMask::ISDIR,
            cookie: 0xDEAD_BEEF,
            len: 16,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.write_to(&mut buf).unwrap();
        assert_eq!(EventHeader::read_from(&buf).unwrap(), header);
    }

    #[test]
    fn fields_use_native_byte_order() {
        let header = EventHeader {
            wd: 3,
            mask: EventMask::CREATE,
            cookie: 0,
            len: 5,
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.write_to(&mut buf).unwrap();
        assert_eq!(&buf[0..4], &3i32.to_ne_bytes());
        assert_eq!(&buf[4..8], &0x100u32.to_ne_bytes());
        assert_eq!(&buf[12..16], &5u32.to_ne_bytes());
    }

    #[test]
    fn negative_wd_survives() {
        // Queue overflow events carry wd = -1.
        let header = EventHeader {
            wd: -1,
            mask: EventMask::Q_OVERFLOW,
            ..EventHeader::default()
        };
        let mut buf = [0u8; HEADER_SIZE];
        header.write_to(&mut buf).unwrap();
        assert_eq!(EventHeader::read_from(&buf).unwrap().wd, -1);
    }

    #[test]
    fn reads_only_the_first_sixteen_bytes() {
        let mut buf = [0xFFu8; HEADER_SIZE + 8];
        EventHeader::default().write_to(&mut buf).unwrap();
        assert_eq!(EventHeader::read_from(&buf).unwrap(), EventHeader::default());
    }

    #[test]
    fn reject_buffer_too_short() {
        let buf = [0u8; 12];
        assert_eq!(
            EventHeader::read_from(&buf),
            Err(WireError::UnexpectedEof { offset: 12 })
        );
        let mut small = [0u8; 4];
        assert!(EventHeader::default().write_to(&mut small).is_err());
    }

    #[test]
    fn record_len_includes_header() {
        let header = EventHeader {
            len: 32,
            ..EventHeader::default()
        };
        assert_eq!(header.record_len(), 48);
        assert_eq!(MIN_BUFFER_SIZE, 272);
    }
}
