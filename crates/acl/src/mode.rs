use std::fmt;
use std::str::FromStr;

use crate::permissions::AclPermissions;

/// Mask of the nine permission bits of a mode.
pub const PERMISSION_BITS: u32 = 0o777;

/// One of the three 3-bit fields of the mode bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PermissionClass {
    /// Bits 6–8.
    Owner,
    /// Bits 3–5. With an extended ACL present the kernel maps these to the
    /// mask entry.
    Group,
    /// Bits 0–2.
    Other,
}

impl PermissionClass {
    const fn shift(self) -> u32 {
        match self {
            Self::Owner => 6,
            Self::Group => 3,
            Self::Other => 0,
        }
    }

    /// The bits of `mode` that belong to this class.
    #[must_use]
    pub const fn field_mask(self) -> u32 {
        0o7 << self.shift()
    }

    /// Reads this class's permissions out of `mode`.
    #[must_use]
    pub const fn extract(self, mode: u32) -> AclPermissions {
        AclPermissions::from_bits_truncate(mode >> self.shift())
    }

    /// Returns `mode` with this class's field replaced by `permissions`.
    ///
    /// Every other bit, including file type and setuid/setgid/sticky, is
    /// preserved.
    #[must_use]
    pub const fn apply(self, mode: u32, permissions: AclPermissions) -> u32 {
        (mode & !self.field_mask()) | ((permissions.bits() as u32) << self.shift())
    }
}

impl fmt::Display for PermissionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "owner",
            Self::Group => "group",
            Self::Other => "other",
        })
    }
}

/// Error returned for an unrecognised class name.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown permission class '{0}': expected owner, group or other")]
pub struct ParseClassError(String);

impl FromStr for PermissionClass {
    type Err = ParseClassError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text {
            "owner" | "user" | "u" => Ok(Self::Owner),
            "group" | "g" => Ok(Self::Group),
            "other" | "o" => Ok(Self::Other),
            _ => Err(ParseClassError(text.to_owned())),
        }
    }
}
