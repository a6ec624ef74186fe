use crate::error::WireError;
use crate::header::{EventHeader, HEADER_SIZE};
use crate::mask::EventMask;

/// Payload alignment the kernel uses: names are NUL-padded so that
/// `len` is a multiple of the header size.
pub const KERNEL_ALIGN: usize = HEADER_SIZE;

/// Builder for kernel-shaped records.
///
/// The kernel never needs this; it exists so tests, benches, fuzz
/// targets and tooling can produce byte streams identical to what
/// `read(2)` on an inotify descriptor returns.
///
/// ```text
/// ┌──────────────────────────────────────────────────┐
/// │ header       (16 bytes, len = payload size)      │
/// │ name         (name.len() bytes)                  │
/// │ NUL          (1 byte)                            │
/// │ padding      (NUL bytes up to the alignment)     │
/// └──────────────────────────────────────────────────┘
/// ```
///
/// A record without a name has `len = 0` and no payload at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordBuilder {
    wd: i32,
    mask: EventMask,
    cookie: u32,
    name: Option<Vec<u8>>,
    align: usize,
}

impl RecordBuilder {
    #[must_use]
    pub fn new(wd: i32, mask: EventMask) -> Self {
        Self {
            wd,
            mask,
            cookie: 0,
            name: None,
            align: KERNEL_ALIGN,
        }
    }

    #[must_use]
    pub fn cookie(mut self, cookie: u32) -> Self {
        self.cookie = cookie;
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl AsRef<[u8]>) -> Self {
        self.name = Some(name.as_ref().to_vec());
        self
    }

    /// Pad the payload to a multiple of `align` bytes. `0` and `1` both
    /// mean "no padding beyond the NUL terminator".
    #[must_use]
    pub fn align(mut self, align: usize) -> Self {
        self.align = align;
        self
    }

    /// Payload size this builder will announce in the header.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        match &self.name {
            None => 0,
            Some(name) => {
                let unpadded = name.len() + 1;
                match self.align {
                    0 | 1 => unpadded,
                    a => unpadded.div_ceil(a) * a,
                }
            }
        }
    }

    /// Append the encoded record to `out`.
    ///
    /// # Returns
    ///
    /// Number of bytes appended.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::PayloadTooLong`] if the padded payload does not
    /// fit in the 32-bit `len` field.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<usize, WireError> {
        let payload_len = self.payload_len();
        let len = u32::try_from(payload_len)
            .map_err(|_| WireError::PayloadTooLong { len: payload_len })?;

        let header = EventHeader {
            wd: self.wd,
            mask: self.mask,
            cookie: self.cookie,
            len,
        };

        let start = out.len();
        out.resize(start + HEADER_SIZE, 0);
        header.write_to(&mut out[start..])?;

        if let Some(name) = &self.name {
            out.extend_from_slice(name);
            // NUL terminator plus padding, all zero.
            out.resize(start + HEADER_SIZE + payload_len, 0);
        }

        Ok(out.len() - start)
    }

    /// Encode into a fresh vector.
    ///
    /// # Errors
    ///
    /// See [`write_to`](Self::write_to).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.payload_len());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

/// Encode one kernel-shaped record.
///
/// Shorthand for [`RecordBuilder`] with kernel alignment.
///
/// # Errors
///
/// See [`RecordBuilder::write_to`].
pub fn encode_record(
    wd: i32,
    mask: EventMask,
    cookie: u32,
    name: Option<&str>,
) -> Result<Vec<u8>, WireError> {
    let mut builder = RecordBuilder::new(wd, mask).cookie(cookie);
    if let Some(name) = name {
        builder = builder.name(name);
    }
    builder.to_bytes()
}
