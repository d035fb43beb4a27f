use std::fmt;

use crate::id_lookup;
use crate::permissions::AclPermissions;
use crate::tag::AclTag;

/// Id stored in entries that do not name a principal.
pub const ACL_UNDEFINED_ID: u32 = u32::MAX;

/// One entry of a POSIX ACL.
///
/// Entries are plain values; a list replaces an entry at its index instead of
/// editing it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct AclEntry {
    tag: AclTag,
    permissions: AclPermissions,
    id: u32,
}

impl AclEntry {
    /// Creates an entry from its raw parts.
    #[must_use]
    pub const fn new(tag: AclTag, permissions: AclPermissions, id: u32) -> Self {
        Self {
            tag,
            permissions,
            id,
        }
    }

    /// Creates a `UserObj`, `GroupObj`, `Mask` or `Other` entry.
    #[must_use]
    pub const fn structural(tag: AclTag, permissions: AclPermissions) -> Self {
        Self::new(tag, permissions, ACL_UNDEFINED_ID)
    }

    /// Creates a named-user entry.
    #[must_use]
    pub const fn user(uid: u32, permissions: AclPermissions) -> Self {
        Self::new(AclTag::User, permissions, uid)
    }

    /// Creates a named-group entry.
    #[must_use]
    pub const fn group(gid: u32, permissions: AclPermissions) -> Self {
        Self::new(AclTag::Group, permissions, gid)
    }

    /// Entry class.
    #[must_use]
    pub const fn tag(&self) -> AclTag {
        self.tag
    }

    /// Granted permissions.
    #[must_use]
    pub const fn permissions(&self) -> AclPermissions {
        self.permissions
    }

    /// Principal id, or [`ACL_UNDEFINED_ID`].
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns a copy with `permissions` replaced.
    #[must_use]
    pub const fn with_permissions(self, permissions: AclPermissions) -> Self {
        Self::new(self.tag, permissions, self.id)
    }

    /// Sort key: tag ordinal first, then id.
    #[must_use]
    pub const fn sort_key(&self) -> (AclTag, u32) {
        (self.tag, self.id)
    }

    /// Whether the id agrees with the tag.
    #[must_use]
    pub const fn has_valid_id(&self) -> bool {
        self.tag.is_principal() == (self.id != ACL_UNDEFINED_ID)
    }
}

/// Renders the `getfacl` form, e.g. `user:nginx:rw-`.
///
/// Named entries resolve through the passwd/group databases and fall back to
/// the numeric id when no name is known.
impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = self.tag.keyword();
        match self.tag {
            AclTag::User => match id_lookup::user_name(self.id) {
                Some(name) => write!(f, "{keyword}:{name}:{}", self.permissions),
                None => write!(f, "{keyword}:{}:{}", self.id, self.permissions),
            },
            AclTag::Group => match id_lookup::group_name(self.id) {
                Some(name) => write!(f, "{keyword}:{name}:{}", self.permissions),
                None => write!(f, "{keyword}:{}:{}", self.id, self.permissions),
            },
            _ => write!(f, "{keyword}::{}", self.permissions),
        }
    }
}
