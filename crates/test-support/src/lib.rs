//! Capability checks for tests that need POSIX ACLs from the file system
//! hosting the temporary directory.

use std::fs;
use std::path::Path;

const CAPABILITY_FILE: &str = ".sockacl-acl-check";

/// Returns `true` when files created inside `dir` accept an access ACL with
/// a named-user entry.
///
/// The scratch file is removed again before returning.
pub fn acls_supported(dir: &Path) -> bool {
    let scratch = dir.join(CAPABILITY_FILE);
    if fs::write(&scratch, b"").is_err() {
        return false;
    }
    let supported = xattr::set(&scratch, "system.posix_acl_access", &named_user_acl()).is_ok();
    let _ = fs::remove_file(&scratch);
    supported
}

/// Raw access ACL granting the current user `rw-` next to the implicit
/// entries of mode `0644`.
fn named_user_acl() -> Vec<u8> {
    const UNDEFINED: u32 = u32::MAX;
    let uid = rustix::process::getuid().as_raw();
    let entries: [(u16, u16, u32); 5] = [
        (0x01, 6, UNDEFINED),
        (0x02, 6, uid),
        (0x04, 4, UNDEFINED),
        (0x10, 6, UNDEFINED),
        (0x20, 4, UNDEFINED),
    ];

    let mut bytes = 2u32.to_le_bytes().to_vec();
    for (tag, perm, id) in entries {
        bytes.extend_from_slice(&tag.to_le_bytes());
        bytes.extend_from_slice(&perm.to_le_bytes());
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn named_user_acl_layout() {
        let bytes = named_user_acl();
        assert_eq!(bytes.len(), 4 + 5 * 8);
        assert_eq!(&bytes[..4], &[2, 0, 0, 0]);
    }

    #[test]
    fn capability_check_leaves_no_file_behind() {
        let dir = tempdir().expect("tempdir");
        let _ = acls_supported(dir.path());
        assert!(!dir.path().join(CAPABILITY_FILE).exists());
    }
}
