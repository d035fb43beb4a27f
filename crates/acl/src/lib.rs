#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `acl` reads, edits and writes the POSIX ACLs Linux stores in the
//! `system.posix_acl_access` and `system.posix_acl_default` extended
//! attributes, and keeps them consistent with the owner/group/other mode bits
//! of the file.
//!
//! # Design
//!
//! - [`codec`] converts between attribute bytes and an [`AclList`].
//! - [`AclList`] is a plain value: sorted entries plus the mutators
//!   [`AclList::upsert_principal`], [`AclList::remove_principal`] and
//!   [`AclList::recalculate_mask`]. [`AclList::from_mode`] derives the
//!   implicit list from mode bits.
//! - [`FileNode`] performs the read-modify-write cycle against the file
//!   system and refreshes its cached mode after every access-ACL write.
//!
//! No ACL state outlives a call: each operation reads the attribute fresh
//! and writes it back immediately.
//!
//! # Invariants
//!
//! - Entries are sorted by `(tag, id)` and unique per pair.
//! - `UserObj`, `GroupObj`, `Mask` and `Other` carry [`ACL_UNDEFINED_ID`].
//! - A missing attribute is an empty list, never an error.
//!
//! # Errors
//!
//! Every fallible operation returns [`AclError`]. Attribute write failures
//! carry the raw OS status code.
//!
//! # Examples
//!
//! ```rust,no_run
//! use acl::{AclKind, AclPermissions, AclTag, FileNode, PrincipalKind, resolve_principal};
//!
//! # fn demo() -> Result<(), acl::AclError> {
//! let uid = resolve_principal(PrincipalKind::User, "nginx")?;
//! let mut node = FileNode::open("/var/run/steam-auth/steam-auth.sock")?;
//! node.grant(AclKind::Access, AclTag::User, uid, AclPermissions::READ_WRITE)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod entry;
mod error;
mod id_lookup;
mod implicit;
mod list;
mod mode;
mod node;
mod ownership;
mod permissions;
mod render;
mod tag;
mod xattr;

pub use entry::{ACL_UNDEFINED_ID, AclEntry};
pub use error::{AclError, FormatError, PrincipalKind};
pub use id_lookup::{
    lookup_group_by_name, lookup_group_name, lookup_user_by_name, lookup_user_name,
    resolve_principal,
};
pub use list::AclList;
pub use mode::{PERMISSION_BITS, ParseClassError, PermissionClass};
pub use node::FileNode;
pub use ownership::change_ownership;
pub use permissions::{AclPermissions, ParsePermissionsError};
pub use render::getfacl_text;
pub use tag::AclTag;
pub use xattr::{AclKind, POSIX_ACL_ACCESS_XATTR, POSIX_ACL_DEFAULT_XATTR};
