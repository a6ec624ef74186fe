use inwatch_wire::{HEADER_SIZE, MIN_BUFFER_SIZE};

use crate::error::DecodeError;

/// Buffer capacity used when none is configured. One page, which holds a
/// dozen or more typical records per `read(2)`.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Session-scoped decoder settings, fixed at construction.
///
/// ```text
/// ┌─────────────────┬──────────────────────────────────────────────────┐
/// │ Field           │ Purpose                                          │
/// ├─────────────────┼──────────────────────────────────────────────────┤
/// │ buffer_capacity │ Size of the sliding buffer, never resized        │
/// └─────────────────┴──────────────────────────────────────────────────┘
/// ```
///
/// The capacity must be at least [`HEADER_SIZE`] or construction fails.
/// Anything below [`MIN_BUFFER_SIZE`] is accepted but a record with a long
/// name may then be rejected with
/// [`DecodeError::RecordTooLarge`], and the kernel itself refuses reads
/// into a buffer too small for its next record (`EINVAL`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Fixed size of the working buffer in bytes.
    pub buffer_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl DecoderConfig {
    #[must_use]
    pub fn with_capacity(buffer_capacity: usize) -> Self {
        Self { buffer_capacity }
    }

    /// Check the construction-time invariant.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Configuration`] if the capacity is smaller
    /// than one record header.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.buffer_capacity < HEADER_SIZE {
            return Err(DecodeError::Configuration {
                capacity: self.buffer_capacity,
                minimum: HEADER_SIZE,
            });
        }
        if self.buffer_capacity < MIN_BUFFER_SIZE {
            tracing::warn!(
                capacity = self.buffer_capacity,
                recommended = MIN_BUFFER_SIZE,
                "event buffer cannot hold a record with a maximum-length name"
            );
        }
        Ok(())
    }
}
