//! File-system side of ACL editing.
//!
//! A [`FileNode`] is built per operation from a path. It caches the mode and
//! ownership read by `stat`, and every mutation follows the same sequence:
//!
//! 1. read the attribute (an absent one decodes to an empty list)
//! 2. compute the new list, deriving the implicit list first when empty
//! 3. encode and write the attribute
//! 4. refresh the cached mode after writes to the access ACL
//!
//! The read and the write are separate syscalls with no locking, so two
//! processes editing the same node race and the last writer wins.

use std::fs;
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::AclError;
use crate::list::AclList;
use crate::mode::{PERMISSION_BITS, PermissionClass};
use crate::permissions::AclPermissions;
use crate::tag::AclTag;
use crate::xattr::{self, AclKind};

/// Mode, ownership and ACL access for one path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileNode {
    path: PathBuf,
    mode: u32,
    uid: u32,
    gid: u32,
}

impl FileNode {
    /// Stats `path` and returns a handle for it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AclError> {
        let path = path.into();
        let metadata =
            fs::metadata(&path).map_err(|error| AclError::metadata("stat", &path, error))?;
        Ok(Self {
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            path,
        })
    }

    /// The path this node was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full `st_mode`, including file type bits.
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }

    /// The nine owner/group/other permission bits.
    #[must_use]
    pub const fn permission_bits(&self) -> u32 {
        self.mode & PERMISSION_BITS
    }

    /// Owning user id.
    #[must_use]
    pub const fn uid(&self) -> u32 {
        self.uid
    }

    /// Owning group id.
    #[must_use]
    pub const fn gid(&self) -> u32 {
        self.gid
    }

    /// Whether the node is a directory, and so may carry a default ACL.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        self.mode & (libc::S_IFMT as u32) == libc::S_IFDIR as u32
    }

    /// Re-reads mode and ownership from the file system.
    pub fn refresh(&mut self) -> Result<(), AclError> {
        let metadata = fs::metadata(&self.path)
            .map_err(|error| AclError::metadata("stat", &self.path, error))?;
        self.mode = metadata.mode();
        self.uid = metadata.uid();
        self.gid = metadata.gid();
        Ok(())
    }

    /// Reads and validates the stored ACL of `kind`.
    ///
    /// An absent attribute is an empty list, not an error.
    pub fn read_acl(&self, kind: AclKind) -> Result<AclList, AclError> {
        let Some(bytes) = xattr::read_attribute(&self.path, kind)? else {
            tracing::trace!(
                target: "sockacl::acl",
                path = %self.path.display(),
                %kind,
                "no stored ACL"
            );
            return Ok(AclList::new());
        };
        let list = codec::decode(&bytes)?;
        list.validate()?;
        Ok(list)
    }

    /// The stored access ACL, or the one implied by the mode bits when none
    /// is stored.
    pub fn effective_access_acl(&self) -> Result<AclList, AclError> {
        let list = self.read_acl(AclKind::Access)?;
        if list.is_empty() {
            return Ok(AclList::from_mode(self.mode));
        }
        Ok(list)
    }

    /// Writes `list` as the ACL of `kind`.
    ///
    /// An empty list removes the attribute. After an access-ACL write the
    /// cached mode is refreshed, since the kernel now reports the mask entry
    /// in the group bits.
    pub fn flush(&mut self, kind: AclKind, list: &AclList) -> Result<(), AclError> {
        if list.is_empty() {
            xattr::remove_attribute(&self.path, kind)?;
        } else {
            xattr::write_attribute(&self.path, kind, &codec::encode(list))?;
        }
        tracing::debug!(
            target: "sockacl::acl",
            path = %self.path.display(),
            %kind,
            entries = list.len(),
            "flushed ACL"
        );

        if kind == AclKind::Access {
            self.refresh()?;
        }
        Ok(())
    }

    /// Grants `permissions` to a named user or group.
    ///
    /// Loads the ACL of `kind`, seeding it from the mode bits when none is
    /// stored, inserts or replaces the `(tag, id)` entry, widens the mask to
    /// cover the group class and flushes. Returns the list that was written.
    pub fn grant(
        &mut self,
        kind: AclKind,
        tag: AclTag,
        id: u32,
        permissions: AclPermissions,
    ) -> Result<AclList, AclError> {
        let mut list = self.read_acl(kind)?;
        if list.is_empty() {
            tracing::debug!(
                target: "sockacl::acl",
                path = %self.path.display(),
                mode = format_args!("{:o}", self.permission_bits()),
                "deriving implicit ACL"
            );
            list = AclList::from_mode(self.mode);
        }

        let index = list.upsert_principal(tag, id, permissions)?;
        list.recalculate_mask();
        tracing::debug!(
            target: "sockacl::acl",
            path = %self.path.display(),
            %kind,
            ?tag,
            id,
            %permissions,
            index,
            "upserted ACL entry"
        );

        self.flush(kind, &list)?;
        Ok(list)
    }

    /// Removes the entry for a named user or group.
    ///
    /// Returns `false`, without writing, when no such entry is stored.
    pub fn revoke(&mut self, kind: AclKind, tag: AclTag, id: u32) -> Result<bool, AclError> {
        let mut list = self.read_acl(kind)?;
        if !list.remove_principal(tag, id) {
            return Ok(false);
        }
        list.recalculate_mask();
        self.flush(kind, &list)?;
        Ok(true)
    }

    /// Rewrites one 3-bit field of the mode bits.
    ///
    /// Named entries are not touched. The access ACL is re-read afterwards
    /// and returned, because with an extended ACL present the kernel applies
    /// a group-field change to the mask entry.
    pub fn set_class_permissions(
        &mut self,
        class: PermissionClass,
        permissions: AclPermissions,
    ) -> Result<AclList, AclError> {
        let mode = class.apply(self.mode, permissions) & 0o7777;
        tracing::debug!(
            target: "sockacl::acl",
            path = %self.path.display(),
            %class,
            %permissions,
            mode = format_args!("{mode:o}"),
            "changing mode"
        );
        fs::set_permissions(&self.path, fs::Permissions::from_mode(mode))
            .map_err(|error| AclError::metadata("change mode", &self.path, error))?;
        self.refresh()?;
        self.read_acl(AclKind::Access)
    }

    /// Removes the access ACL, leaving only the mode bits.
    pub fn clear_access_acl(&mut self) -> Result<(), AclError> {
        self.flush(AclKind::Access, &AclList::new())
    }

    /// Removes the default ACL of a directory.
    pub fn remove_default_acl(&mut self) -> Result<(), AclError> {
        self.flush(AclKind::Default, &AclList::new())
    }
}
