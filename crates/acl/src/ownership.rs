#![allow(unsafe_code)]

use std::io;
use std::path::Path;

use rustix::fs::{self as unix_fs, AtFlags, CWD};

use crate::error::AclError;

pub(crate) fn uid_from_raw(raw: rustix::process::RawUid) -> rustix::fs::Uid {
    unsafe { rustix::fs::Uid::from_raw(raw) }
}

pub(crate) fn gid_from_raw(raw: rustix::process::RawGid) -> rustix::fs::Gid {
    unsafe { rustix::fs::Gid::from_raw(raw) }
}

/// Changes the owner and/or group of `path`, following symlinks.
///
/// `None` leaves the corresponding id unchanged.
pub fn change_ownership(
    path: &Path,
    owner: Option<u32>,
    group: Option<u32>,
) -> Result<(), AclError> {
    if owner.is_none() && group.is_none() {
        return Ok(());
    }

    tracing::debug!(
        target: "sockacl::acl",
        path = %path.display(),
        ?owner,
        ?group,
        "changing ownership"
    );

    unix_fs::chownat(
        CWD,
        path,
        owner.map(uid_from_raw),
        group.map(gid_from_raw),
        AtFlags::empty(),
    )
    .map_err(|error| AclError::metadata("change ownership", path, io::Error::from(error)))
}
