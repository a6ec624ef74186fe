use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::WireError;

/// Event mask bitfield, as reported by the kernel and as passed to
/// `inotify_add_watch`.
///
/// The decoder treats this as a pass-through value: every bit the kernel
/// sets survives, including bits this type has no name for.
///
/// Bit layout (low half are event kinds, high half are watch options and
/// per-event flags):
///
/// ```text
///   0x0000_0001 ACCESS          0x0000_0100 CREATE
///   0x0000_0002 MODIFY          0x0000_0200 DELETE
///   0x0000_0004 ATTRIB          0x0000_0400 DELETE_SELF
///   0x0000_0008 CLOSE_WRITE     0x0000_0800 MOVE_SELF
///   0x0000_0010 CLOSE_NOWRITE   0x0000_2000 UNMOUNT
///   0x0000_0020 OPEN            0x0000_4000 Q_OVERFLOW
///   0x0000_0040 MOVED_FROM      0x0000_8000 IGNORED
///   0x0000_0080 MOVED_TO
///
///   0x0100_0000 ONLYDIR         0x2000_0000 MASK_ADD
///   0x0200_0000 DONT_FOLLOW     0x4000_0000 ISDIR
///   0x0400_0000 EXCL_UNLINK     0x8000_0000 ONESHOT
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EventMask(u32);

impl EventMask {
    pub const NONE: Self = Self(0);

    pub const ACCESS: Self = Self(0x0000_0001);
    pub const MODIFY: Self = Self(0x0000_0002);
    pub const ATTRIB: Self = Self(0x0000_0004);
    pub const CLOSE_WRITE: Self = Self(0x0000_0008);
    pub const CLOSE_NOWRITE: Self = Self(0x0000_0010);
    pub const OPEN: Self = Self(0x0000_0020);
    pub const MOVED_FROM: Self = Self(0x0000_0040);
    pub const MOVED_TO: Self = Self(0x0000_0080);
    pub const CREATE: Self = Self(0x0000_0100);
    pub const DELETE: Self = Self(0x0000_0200);
    pub const DELETE_SELF: Self = Self(0x0000_0400);
    pub const MOVE_SELF: Self = Self(0x0000_0800);

    pub const UNMOUNT: Self = Self(0x0000_2000);
    pub const Q_OVERFLOW: Self = Self(0x0000_4000);
    pub const IGNORED: Self = Self(0x0000_8000);

    pub const ONLYDIR: Self = Self(0x0100_0000);
    pub const DONT_FOLLOW: Self = Self(0x0200_0000);
    pub const EXCL_UNLINK: Self = Self(0x0400_0000);
    pub const MASK_ADD: Self = Self(0x2000_0000);
    pub const ISDIR: Self = Self(0x4000_0000);
    pub const ONESHOT: Self = Self(0x8000_0000);

    /// Either close event.
    pub const CLOSE: Self = Self(Self::CLOSE_WRITE.0 | Self::CLOSE_NOWRITE.0);

    /// Either half of a rename.
    pub const MOVE: Self = Self(Self::MOVED_FROM.0 | Self::MOVED_TO.0);

    /// Every event kind a watch can subscribe to.
    pub const ALL_EVENTS: Self = Self(0x0000_0FFF);

    /// Single-bit names in display order.
    const NAMED: [(Self, &'static str); 21] = [
        (Self::ACCESS, "ACCESS"),
        (Self::MODIFY, "MODIFY"),
        (Self::ATTRIB, "ATTRIB"),
        (Self::CLOSE_WRITE, "CLOSE_WRITE"),
        (Self::CLOSE_NOWRITE, "CLOSE_NOWRITE"),
        (Self::OPEN, "OPEN"),
        (Self::MOVED_FROM, "MOVED_FROM"),
        (Self::MOVED_TO, "MOVED_TO"),
        (Self::CREATE, "CREATE"),
        (Self::DELETE, "DELETE"),
        (Self::DELETE_SELF, "DELETE_SELF"),
        (Self::MOVE_SELF, "MOVE_SELF"),
        (Self::UNMOUNT, "UNMOUNT"),
        (Self::Q_OVERFLOW, "Q_OVERFLOW"),
        (Self::IGNORED, "IGNORED"),
        (Self::ONLYDIR, "ONLYDIR"),
        (Self::DONT_FOLLOW, "DONT_FOLLOW"),
        (Self::EXCL_UNLINK, "EXCL_UNLINK"),
        (Self::MASK_ADD, "MASK_ADD"),
        (Self::ISDIR, "ISDIR"),
        (Self::ONESHOT, "ONESHOT"),
    ];

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// All bits of `other` are set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one bit of `other` is set in `self`.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The subject of the event is a directory.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        self.intersects(Self::ISDIR)
    }

    /// The kernel event queue overflowed and events were lost.
    #[must_use]
    pub const fn is_overflow(self) -> bool {
        self.intersects(Self::Q_OVERFLOW)
    }

    /// The watch was removed, explicitly or because its target went away.
    #[must_use]
    pub const fn is_ignored(self) -> bool {
        self.intersects(Self::IGNORED)
    }

    /// Names of the set bits that have one, in bit order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        Self::NAMED
            .into_iter()
            .filter(move |(bit, _)| self.contains(*bit))
            .map(|(_, name)| name)
    }

    /// Bits that have no symbolic name.
    #[must_use]
    pub fn unnamed_bits(self) -> u32 {
        let named = Self::NAMED.iter().fold(0, |acc, (bit, _)| acc | bit.0);
        self.0 & !named
    }

    fn lookup(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("IN_").unwrap_or(&upper);
        match name {
            "CLOSE" => Some(Self::CLOSE),
            "MOVE" => Some(Self::MOVE),
            "ALL" | "ALL_EVENTS" => Some(Self::ALL_EVENTS),
            _ => Self::NAMED
                .iter()
                .find(|(_, n)| *n == name)
                .map(|(bit, _)| *bit),
        }
    }
}

impl BitOr for EventMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for EventMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<u32> for EventMask {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Formats as `CREATE|ISDIR`. Unnamed bits are appended in hex, and an
/// empty mask prints as `0`.
impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in self.names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }

        let rest = self.unnamed_bits();
        if rest != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{rest:#x}")?;
            first = false;
        }

        if first {
            f.write_str("0")?;
        }
        Ok(())
    }
}

/// Parses `create,delete`, `IN_CREATE|IN_DELETE`, or a mix, case
/// insensitive. `close`, `move` and `all` expand to the composite masks.
impl FromStr for EventMask {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split([',', '|'])
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .try_fold(Self::NONE, |acc, token| {
                Self::lookup(token)
                    .map(|bit| acc | bit)
                    .ok_or_else(|| WireError::UnknownMaskName {
                        name: token.to_string(),
                    })
            })
    }
}
