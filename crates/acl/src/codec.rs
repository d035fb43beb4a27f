//! Binary codec for the `system.posix_acl_access` / `system.posix_acl_default`
//! extended attributes.
//!
//! # Wire Format
//!
//! ```text
//! offset 0..4   u32  version (always 2)
//! offset 4..N   repeated 8-byte entries:
//!               u16 tag    (1=user_obj, 2=user, 4=group_obj, 8=group, 16=mask, 32=other)
//!               u16 perm   (bit0=execute, bit1=write, bit2=read)
//!               u32 id     (uid/gid, or 0xFFFFFFFF when not applicable)
//! ```
//!
//! All integers are little-endian; the kernel converts with `le*_to_cpu`
//! regardless of host byte order.
//!
//! The codec only checks byte-level structure. Ordering and id rules are
//! checked by [`AclList::validate`].

use crate::entry::AclEntry;
use crate::error::FormatError;
use crate::list::AclList;
use crate::permissions::AclPermissions;
use crate::tag::AclTag;

/// Header version written by the kernel and libacl.
pub const POSIX_ACL_XATTR_VERSION: u32 = 0x0002;

/// Size of the version header in bytes.
pub const HEADER_SIZE: usize = 4;

/// Size of one encoded entry in bytes.
pub const ENTRY_SIZE: usize = 8;

/// Decodes an attribute value into an [`AclList`].
///
/// Entries are read while at least [`ENTRY_SIZE`] bytes remain; a partial
/// trailing entry is an error rather than being silently dropped.
pub fn decode(bytes: &[u8]) -> Result<AclList, FormatError> {
    let Some((header, mut rest)) = bytes.split_first_chunk::<HEADER_SIZE>() else {
        return Err(FormatError::TruncatedHeader { len: bytes.len() });
    };

    let version = u32::from_le_bytes(*header);
    if version != POSIX_ACL_XATTR_VERSION {
        return Err(FormatError::UnsupportedVersion(version));
    }

    let mut entries = Vec::with_capacity(rest.len() / ENTRY_SIZE);
    while let Some((raw, tail)) = rest.split_first_chunk::<ENTRY_SIZE>() {
        entries.push(decode_entry(raw)?);
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(FormatError::TrailingBytes(rest.len()));
    }

    Ok(AclList::from_entries_unchecked(entries))
}

fn decode_entry(raw: &[u8; ENTRY_SIZE]) -> Result<AclEntry, FormatError> {
    let tag = u16::from_le_bytes([raw[0], raw[1]]);
    let perm = u16::from_le_bytes([raw[2], raw[3]]);
    let id = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);

    let tag = AclTag::try_from(tag)?;
    let permissions =
        AclPermissions::from_bits(perm).ok_or(FormatError::InvalidPermissions(perm))?;
    Ok(AclEntry::new(tag, permissions, id))
}

/// Encodes `list` in its current entry order.
///
/// Callers are responsible for keeping the list sorted; [`AclList`]'s
/// mutators do so.
#[must_use]
pub fn encode(list: &AclList) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_SIZE + list.len() * ENTRY_SIZE);
    bytes.extend_from_slice(&POSIX_ACL_XATTR_VERSION.to_le_bytes());
    for entry in list.entries() {
        bytes.extend_from_slice(&entry.tag().as_raw().to_le_bytes());
        bytes.extend_from_slice(&entry.permissions().bits().to_le_bytes());
        bytes.extend_from_slice(&entry.id().to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::ACL_UNDEFINED_ID;
    use proptest::prelude::*;

    /// `getfattr -e hex -n system.posix_acl_access` on a file after
    /// `setfacl -m u:1001:rw- f` with mode 0644.
    const NAMED_USER_ACL: [u8; 44] = [
        0x02, 0x00, 0x00, 0x00, // version
        0x01, 0x00, 0x06, 0x00, 0xff, 0xff, 0xff, 0xff, // user::rw-
        0x02, 0x00, 0x06, 0x00, 0xe9, 0x03, 0x00, 0x00, // user:1001:rw-
        0x04, 0x00, 0x04, 0x00, 0xff, 0xff, 0xff, 0xff, // group::r--
        0x10, 0x00, 0x06, 0x00, 0xff, 0xff, 0xff, 0xff, // mask::rw-
        0x20, 0x00, 0x04, 0x00, 0xff, 0xff, 0xff, 0xff, // other::r--
    ];

    fn named_user_list() -> AclList {
        AclList::from_entries_unchecked(vec![
            AclEntry::structural(AclTag::UserObj, AclPermissions::READ_WRITE),
            AclEntry::user(1001, AclPermissions::READ_WRITE),
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::Mask, AclPermissions::READ_WRITE),
            AclEntry::structural(AclTag::Other, AclPermissions::READ),
        ])
    }

    #[test]
    fn decodes_kernel_layout() {
        let list = decode(&NAMED_USER_ACL).expect("decode");
        assert_eq!(list, named_user_list());
        assert_eq!(list.entries()[1].id(), 1001);
        assert_eq!(list.entries()[0].id(), ACL_UNDEFINED_ID);
    }

    #[test]
    fn encodes_kernel_layout() {
        assert_eq!(encode(&named_user_list()), NAMED_USER_ACL);
    }

    #[test]
    fn round_trip_preserves_list() {
        let list = named_user_list();
        assert_eq!(decode(&encode(&list)).expect("decode"), list);
    }

    #[test]
    fn header_only_is_an_empty_list() {
        let list = decode(&[2, 0, 0, 0]).expect("decode");
        assert!(list.is_empty());
        assert_eq!(encode(&list), [2, 0, 0, 0]);
    }

    #[test]
    fn rejects_short_header() {
        assert_eq!(decode(&[]), Err(FormatError::TruncatedHeader { len: 0 }));
        assert_eq!(
            decode(&[2, 0, 0]),
            Err(FormatError::TruncatedHeader { len: 3 })
        );
    }

    #[test]
    fn rejects_other_versions() {
        let mut bytes = NAMED_USER_ACL;
        bytes[0] = 1;
        assert_eq!(decode(&bytes), Err(FormatError::UnsupportedVersion(1)));
    }

    #[test]
    fn rejects_partial_trailing_entry() {
        assert_eq!(
            decode(&NAMED_USER_ACL[..NAMED_USER_ACL.len() - 3]),
            Err(FormatError::TrailingBytes(5))
        );
    }

    #[test]
    fn user_obj_entry_with_zero_high_bytes_is_not_end_of_list() {
        // A user_obj tag encodes as 0x01 0x00; the second byte must not be
        // mistaken for a terminator.
        let bytes = [
            0x02, 0x00, 0x00, 0x00, //
            0x01, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, //
            0x04, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, //
            0x20, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
        ];
        let list = decode(&bytes).expect("decode");
        assert_eq!(list.len(), 3);
        assert_eq!(list.entries()[2].tag(), AclTag::Other);
    }

    #[test]
    fn rejects_unknown_tag() {
        let mut bytes = NAMED_USER_ACL;
        bytes[4] = 0x40;
        assert_eq!(decode(&bytes), Err(FormatError::UnknownTag(0x40)));
    }

    #[test]
    fn rejects_permission_bits_beyond_rwx() {
        let mut bytes = NAMED_USER_ACL;
        bytes[6] = 0x08;
        assert_eq!(decode(&bytes), Err(FormatError::InvalidPermissions(0x08)));
    }

    fn raw_entry() -> impl Strategy<Value = [u8; ENTRY_SIZE]> {
        let tag = prop::sample::select(vec![0x01u16, 0x02, 0x04, 0x08, 0x10, 0x20]);
        (tag, 0u16..8, any::<u32>()).prop_map(|(tag, perm, id)| {
            let mut raw = [0u8; ENTRY_SIZE];
            raw[..2].copy_from_slice(&tag.to_le_bytes());
            raw[2..4].copy_from_slice(&perm.to_le_bytes());
            raw[4..].copy_from_slice(&id.to_le_bytes());
            raw
        })
    }

    proptest! {
        #[test]
        fn well_formed_values_reencode_identically(
            entries in prop::collection::vec(raw_entry(), 0..=16),
        ) {
            let mut bytes = POSIX_ACL_XATTR_VERSION.to_le_bytes().to_vec();
            for raw in &entries {
                bytes.extend_from_slice(raw);
            }

            let list = decode(&bytes).expect("well-formed value decodes");
            prop_assert_eq!(list.len(), entries.len());
            prop_assert_eq!(encode(&list), bytes);
        }

        #[test]
        fn arbitrary_bodies_decode_or_fail_cleanly(
            body in prop::collection::vec(any::<u8>(), 0..=80),
        ) {
            let mut bytes = POSIX_ACL_XATTR_VERSION.to_le_bytes().to_vec();
            bytes.extend_from_slice(&body);

            if let Ok(list) = decode(&bytes) {
                prop_assert_eq!(body.len() % ENTRY_SIZE, 0);
                prop_assert_eq!(encode(&list), bytes);
            }
        }
    }
}
