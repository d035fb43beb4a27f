//! Error types for ACL codec, model and file-system operations.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Byte-level problems found while decoding a `system.posix_acl_*` value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FormatError {
    /// The value is shorter than the 4-byte header.
    #[error("attribute is {len} bytes, shorter than the 4-byte header")]
    TruncatedHeader {
        /// Length of the attribute value.
        len: usize,
    },

    /// The header carries a version other than 2.
    #[error("unsupported ACL xattr version {0}")]
    UnsupportedVersion(u32),

    /// Bytes left over after the last complete 8-byte entry.
    #[error("{0} trailing bytes after the last complete entry")]
    TrailingBytes(usize),

    /// An entry carries a tag outside the six known classes.
    #[error("unknown ACL entry tag {0:#x}")]
    UnknownTag(u16),

    /// An entry carries permission bits outside `rwx`.
    #[error("invalid ACL permission bits {0:#x}")]
    InvalidPermissions(u16),
}

/// Whether a principal name refers to a user or a group.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PrincipalKind {
    /// A user from the passwd database.
    User,
    /// A group from the group database.
    Group,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
        })
    }
}

/// Error produced by ACL operations.
#[derive(Debug, thiserror::Error)]
pub enum AclError {
    /// The stored attribute bytes are malformed.
    #[error("malformed ACL attribute: {0}")]
    Format(#[from] FormatError),

    /// Reading the attribute failed for a reason other than absence.
    #[error("failed to read {name} on '{}': {source}", path.display())]
    AttributeRead {
        /// File whose attribute was read.
        path: PathBuf,
        /// Attribute name.
        name: &'static str,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing or removing the attribute failed.
    #[error("failed to write {name} on '{}' (status {code}): {source}", path.display())]
    AttributeWrite {
        /// File whose attribute was written.
        path: PathBuf,
        /// Attribute name.
        name: &'static str,
        /// Raw OS status code, `-1` when the platform reported none.
        code: i32,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A mode-bit or ownership syscall failed.
    #[error("failed to {context} '{}': {source}", path.display())]
    Metadata {
        /// Operation being performed.
        context: &'static str,
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// No user or group exists with the supplied name.
    #[error("unknown {kind} '{name}'")]
    PrincipalResolution {
        /// User or group.
        kind: PrincipalKind,
        /// Name as supplied by the caller.
        name: String,
    },

    /// The user or group database could not be consulted.
    #[error("failed to look up {kind} '{name}': {source}")]
    PrincipalLookup {
        /// User or group.
        kind: PrincipalKind,
        /// Name as supplied by the caller.
        name: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// An ACL violates the POSIX structural rules.
    #[error("ACL invariant violated: {0}")]
    InvariantViolation(String),
}

impl AclError {
    pub(crate) fn metadata(context: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Metadata {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn attribute_read(path: &Path, name: &'static str, source: io::Error) -> Self {
        Self::AttributeRead {
            path: path.to_path_buf(),
            name,
            source,
        }
    }

    pub(crate) fn attribute_write(path: &Path, name: &'static str, source: io::Error) -> Self {
        Self::AttributeWrite {
            path: path.to_path_buf(),
            name,
            code: source.raw_os_error().unwrap_or(-1),
            source,
        }
    }

    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Returns the raw OS status code carried by the error, if any.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::AttributeWrite { code, .. } => Some(*code),
            Self::AttributeRead { source, .. }
            | Self::Metadata { source, .. }
            | Self::PrincipalLookup { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
