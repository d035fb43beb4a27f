use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Read/write/execute permission set of an ACL entry.
///
/// # Layout
///
/// - Bit 0: execute
/// - Bit 1: write
/// - Bit 2: read
///
/// The same layout as one 3-bit field of the mode bits, so conversion to and
/// from a mode class is a shift.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct AclPermissions(u16);

impl AclPermissions {
    /// No permissions.
    pub const NONE: Self = Self(0);
    /// Execute (or search, on directories).
    pub const EXECUTE: Self = Self(1 << 0);
    /// Write.
    pub const WRITE: Self = Self(1 << 1);
    /// Read.
    pub const READ: Self = Self(1 << 2);
    /// Read and write.
    pub const READ_WRITE: Self = Self(Self::READ.0 | Self::WRITE.0);
    /// All three bits.
    pub const ALL: Self = Self(0b111);

    /// Creates a set from raw bits, rejecting anything outside `rwx`.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        if bits & !Self::ALL.0 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Creates a set from the low three bits of `bits`.
    #[must_use]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self((bits & 0b111) as u16)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns `true` when every bit of `other` is present.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns the union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns `true` when no bits are set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AclPermissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for AclPermissions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for AclPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AclPermissions({self})")
    }
}

/// Renders the `rwx` triplet used by `getfacl`, with `-` for missing bits.
impl fmt::Display for AclPermissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let read = if self.contains(Self::READ) { 'r' } else { '-' };
        let write = if self.contains(Self::WRITE) { 'w' } else { '-' };
        let execute = if self.contains(Self::EXECUTE) { 'x' } else { '-' };
        write!(f, "{read}{write}{execute}")
    }
}

/// Error returned when a permission string cannot be parsed.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid permission string '{0}': expected a subset of 'rwx' or an octal digit")]
pub struct ParsePermissionsError(String);

/// Parses `rwx`-style text (`rw-`, `rw`, `r`, `-`) or a single octal digit.
impl FromStr for AclPermissions {
    type Err = ParsePermissionsError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || ParsePermissionsError(text.to_owned());

        if text.len() == 1
            && let Some(digit) = text.chars().next().and_then(|c| c.to_digit(8))
        {
            return Ok(Self::from_bits_truncate(digit));
        }

        if text.is_empty() || text.len() > 3 {
            return Err(invalid());
        }

        let mut permissions = Self::NONE;
        for c in text.chars() {
            let bit = match c {
                'r' => Self::READ,
                'w' => Self::WRITE,
                'x' => Self::EXECUTE,
                '-' => continue,
                _ => return Err(invalid()),
            };
            if permissions.contains(bit) {
                return Err(invalid());
            }
            permissions |= bit;
        }
        Ok(permissions)
    }
}
