use std::fmt;

use crate::error::{FormatError, PrincipalKind};

/// Class of an ACL entry.
///
/// The discriminants are the `e_tag` values stored in the xattr and also
/// define the order entries must appear in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum AclTag {
    /// The file owner (`user::`).
    UserObj = 0x01,
    /// A named user (`user:<name>:`).
    User = 0x02,
    /// The owning group (`group::`).
    GroupObj = 0x04,
    /// A named group (`group:<name>:`).
    Group = 0x08,
    /// Upper bound on the group class (`mask::`).
    Mask = 0x10,
    /// Everyone else (`other::`).
    Other = 0x20,
}

impl AclTag {
    /// Returns the raw `e_tag` value.
    #[must_use]
    pub const fn as_raw(self) -> u16 {
        self as u16
    }

    /// Returns `true` for tags that name a principal and carry a real id.
    #[must_use]
    pub const fn is_principal(self) -> bool {
        matches!(self, Self::User | Self::Group)
    }

    /// Returns `true` for the tags whose permissions fall in the group class.
    #[must_use]
    pub const fn is_group_class(self) -> bool {
        matches!(self, Self::User | Self::GroupObj | Self::Group)
    }

    /// Keyword used in the textual `getfacl` form.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::UserObj | Self::User => "user",
            Self::GroupObj | Self::Group => "group",
            Self::Mask => "mask",
            Self::Other => "other",
        }
    }
}

impl TryFrom<u16> for AclTag {
    type Error = FormatError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::UserObj),
            0x02 => Ok(Self::User),
            0x04 => Ok(Self::GroupObj),
            0x08 => Ok(Self::Group),
            0x10 => Ok(Self::Mask),
            0x20 => Ok(Self::Other),
            other => Err(FormatError::UnknownTag(other)),
        }
    }
}

impl fmt::Display for AclTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The named-entry tag for a kind of principal.
impl From<PrincipalKind> for AclTag {
    fn from(kind: PrincipalKind) -> Self {
        match kind {
            PrincipalKind::User => Self::User,
            PrincipalKind::Group => Self::Group,
        }
    }
}
