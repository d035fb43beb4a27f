use std::fmt;
use std::io;
use std::path::Path;

use crate::error::AclError;

/// Attribute holding the access ACL.
pub const POSIX_ACL_ACCESS_XATTR: &str = "system.posix_acl_access";

/// Attribute holding the default ACL inherited by new children of a
/// directory.
pub const POSIX_ACL_DEFAULT_XATTR: &str = "system.posix_acl_default";

/// Which of a node's two ACLs an operation targets.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AclKind {
    /// Permissions checked on access to the node itself.
    Access,
    /// Permissions new children of a directory start with.
    Default,
}

impl AclKind {
    /// Extended attribute name for this kind.
    #[must_use]
    pub const fn xattr_name(self) -> &'static str {
        match self {
            Self::Access => POSIX_ACL_ACCESS_XATTR,
            Self::Default => POSIX_ACL_DEFAULT_XATTR,
        }
    }
}

impl fmt::Display for AclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Default => "default",
        })
    }
}

/// No attribute stored, or a file system that cannot store one.
fn is_absent(error: &io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(libc::ENODATA | libc::EOPNOTSUPP)
    )
}

/// Reads the raw attribute value, `None` when the node stores no ACL of this
/// kind.
pub(crate) fn read_attribute(path: &Path, kind: AclKind) -> Result<Option<Vec<u8>>, AclError> {
    let name = kind.xattr_name();
    match ::xattr::get(path, name) {
        Ok(value) => Ok(value),
        Err(error) if is_absent(&error) => Ok(None),
        Err(error) => Err(AclError::attribute_read(path, name, error)),
    }
}

pub(crate) fn write_attribute(path: &Path, kind: AclKind, value: &[u8]) -> Result<(), AclError> {
    let name = kind.xattr_name();
    ::xattr::set(path, name, value).map_err(|error| AclError::attribute_write(path, name, error))
}

/// Removes the attribute; removing an absent attribute succeeds.
pub(crate) fn remove_attribute(path: &Path, kind: AclKind) -> Result<(), AclError> {
    let name = kind.xattr_name();
    match ::xattr::remove(path, name) {
        Ok(()) => Ok(()),
        Err(error) if is_absent(&error) => Ok(()),
        Err(error) => Err(AclError::attribute_write(path, name, error)),
    }
}
