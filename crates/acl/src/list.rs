use std::fmt;

use crate::entry::AclEntry;
use crate::error::AclError;
use crate::permissions::AclPermissions;
use crate::tag::AclTag;

/// The entries of one ACL (access or default) of one file.
///
/// # Invariants
///
/// Lists produced by the mutators stay sorted by `(tag, id)` with at most one
/// entry per pair. Lists decoded from disk are checked with
/// [`validate`](Self::validate) before use. An empty list means no ACL is
/// stored and the mode bits alone apply.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AclList {
    entries: Vec<AclEntry>,
}

impl AclList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Builds a list from entries in any order, sorting them.
    ///
    /// Duplicates are kept so [`validate`](Self::validate) can report them.
    #[must_use]
    pub fn from_entries(mut entries: Vec<AclEntry>) -> Self {
        entries.sort_by_key(AclEntry::sort_key);
        Self { entries }
    }

    pub(crate) const fn from_entries_unchecked(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Entries in stored order.
    #[must_use]
    pub fn entries(&self) -> &[AclEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no ACL is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry with exactly this `(tag, id)`.
    #[must_use]
    pub fn find(&self, tag: AclTag, id: u32) -> Option<usize> {
        self.entries
            .binary_search_by_key(&(tag, id), AclEntry::sort_key)
            .ok()
    }

    /// Entry with exactly this `(tag, id)`.
    #[must_use]
    pub fn get(&self, tag: AclTag, id: u32) -> Option<&AclEntry> {
        self.find(tag, id).map(|index| &self.entries[index])
    }

    /// The first entry carrying `tag`; meant for the structural tags.
    #[must_use]
    pub fn structural(&self, tag: AclTag) -> Option<&AclEntry> {
        self.entries.iter().find(|entry| entry.tag() == tag)
    }

    /// Inserts or replaces the entry for a named user or group.
    ///
    /// The scan walks entries in order until it leaves the block of `tag`. An
    /// exact `(tag, id)` match is replaced at the same index; otherwise the
    /// new entry is inserted where the scan stopped, which keeps the list
    /// sorted without a re-sort. Other entries are not touched, including the
    /// mask; see [`recalculate_mask`](Self::recalculate_mask).
    ///
    /// The list must already hold its structural entries, for example from
    /// [`from_mode`](Self::from_mode). An empty list is rejected with
    /// [`AclError::InvariantViolation`] since a lone named entry is not a
    /// valid ACL.
    ///
    /// Returns the index of the written entry.
    pub fn upsert_principal(
        &mut self,
        tag: AclTag,
        id: u32,
        permissions: AclPermissions,
    ) -> Result<usize, AclError> {
        if !tag.is_principal() {
            return Err(AclError::invariant(format!(
                "cannot upsert {tag:?}: only named user and group entries carry an id"
            )));
        }
        let entry = AclEntry::new(tag, permissions, id);
        if !entry.has_valid_id() {
            return Err(AclError::invariant(format!(
                "{tag:?} entry cannot use the undefined id"
            )));
        }
        if self.entries.is_empty() {
            return Err(AclError::invariant(format!(
                "cannot upsert {tag:?} {id} into an empty ACL"
            )));
        }

        let mut cursor = 0;
        while cursor < self.entries.len() {
            let current = self.entries[cursor];
            if current.tag() < tag {
                cursor += 1;
                continue;
            }
            if current.tag() > tag || current.id() > id {
                break;
            }
            if current.id() == id {
                self.entries[cursor] = entry;
                return Ok(cursor);
            }
            cursor += 1;
        }

        self.entries.insert(cursor, entry);
        Ok(cursor)
    }

    /// Removes the entry for a named user or group, returning whether one
    /// existed.
    pub fn remove_principal(&mut self, tag: AclTag, id: u32) -> bool {
        match self.find(tag, id) {
            Some(index) if tag.is_principal() => {
                self.entries.remove(index);
                true
            }
            _ => false,
        }
    }

    /// Sets the mask to the union of every group-class entry.
    ///
    /// When named entries exist and no mask does, one is inserted before the
    /// `Other` entry. A list without named entries keeps whatever mask it has.
    pub fn recalculate_mask(&mut self) {
        let union = self
            .entries
            .iter()
            .filter(|entry| entry.tag().is_group_class())
            .fold(AclPermissions::NONE, |acc, entry| acc | entry.permissions());
        let has_named = self.entries.iter().any(|entry| entry.tag().is_principal());

        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.tag() == AclTag::Mask)
        {
            self.entries[index] = self.entries[index].with_permissions(union);
        } else if has_named {
            let index = self
                .entries
                .iter()
                .position(|entry| entry.tag() > AclTag::Mask)
                .unwrap_or(self.entries.len());
            self.entries
                .insert(index, AclEntry::structural(AclTag::Mask, union));
        }
    }

    /// Returns `true` when the list carries nothing the mode bits cannot
    /// express: no named entries, and a mask (if any) equal to the owning
    /// group's permissions.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        if self.entries.iter().any(|entry| entry.tag().is_principal()) {
            return false;
        }
        match (
            self.structural(AclTag::Mask),
            self.structural(AclTag::GroupObj),
        ) {
            (Some(mask), Some(group)) => mask.permissions() == group.permissions(),
            _ => true,
        }
    }

    /// Checks the POSIX structural rules.
    ///
    /// - structural entries carry the undefined id; named ones a real id
    /// - entries sorted by `(tag, id)` with no duplicate pair
    /// - exactly one `UserObj`, `GroupObj` and `Other`
    /// - a `Mask` whenever named entries exist
    ///
    /// An empty list is valid.
    pub fn validate(&self) -> Result<(), AclError> {
        if self.entries.is_empty() {
            return Ok(());
        }

        for entry in &self.entries {
            if !entry.has_valid_id() {
                return Err(AclError::invariant(format!(
                    "{:?} entry carries id {:#x}",
                    entry.tag(),
                    entry.id()
                )));
            }
        }

        for pair in self.entries.windows(2) {
            let (previous, next) = (pair[0].sort_key(), pair[1].sort_key());
            if previous == next {
                return Err(AclError::invariant(format!(
                    "duplicate {:?} entry for id {:#x}",
                    next.0, next.1
                )));
            }
            if previous > next {
                return Err(AclError::invariant(format!(
                    "{:?} entry out of order after {:?}",
                    next.0, previous.0
                )));
            }
        }

        for tag in [AclTag::UserObj, AclTag::GroupObj, AclTag::Other] {
            if self.structural(tag).is_none() {
                return Err(AclError::invariant(format!("missing {tag:?} entry")));
            }
        }

        let has_named = self.entries.iter().any(|entry| entry.tag().is_principal());
        if has_named && self.structural(AclTag::Mask).is_none() {
            return Err(AclError::invariant(
                "named entries present without a mask entry",
            ));
        }

        Ok(())
    }
}

/// One entry per line in `getfacl` form.
impl fmt::Display for AclList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::entry::ACL_UNDEFINED_ID;
    use proptest::prelude::*;

    fn implicit_640() -> AclList {
        AclList::from_mode(0o640)
    }

    fn assert_sorted_unique(list: &AclList) {
        for pair in list.entries().windows(2) {
            assert!(
                pair[0].sort_key() < pair[1].sort_key(),
                "{:?} !< {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn upsert_inserts_named_user_after_owner() {
        let mut list = implicit_640();
        let before = list.clone();

        let index = list
            .upsert_principal(AclTag::User, 1001, AclPermissions::READ_WRITE)
            .expect("upsert");

        assert_eq!(index, 1);
        assert_eq!(list.len(), 5);
        assert_eq!(list.entries()[1], AclEntry::user(1001, AclPermissions::READ_WRITE));
        assert_eq!(list.entries()[0], before.entries()[0]);
        assert_eq!(&list.entries()[2..], &before.entries()[1..]);
        assert_sorted_unique(&list);
    }

    #[test]
    fn upsert_twice_is_idempotent() {
        let mut once = implicit_640();
        once.upsert_principal(AclTag::User, 1001, AclPermissions::READ_WRITE)
            .expect("upsert");

        let mut twice = once.clone();
        twice
            .upsert_principal(AclTag::User, 1001, AclPermissions::READ_WRITE)
            .expect("upsert");

        assert_eq!(once, twice);
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut list = implicit_640();
        list.upsert_principal(AclTag::User, 1001, AclPermissions::READ)
            .expect("insert");
        let index = list
            .upsert_principal(AclTag::User, 1001, AclPermissions::ALL)
            .expect("replace");
        assert_eq!(index, 1);
        assert_eq!(list.len(), 5);
        assert_eq!(list.entries()[1].permissions(), AclPermissions::ALL);
    }

    #[test]
    fn upsert_orders_ids_within_tag_block() {
        let mut list = implicit_640();
        for id in [1003, 1001, 1002] {
            list.upsert_principal(AclTag::User, id, AclPermissions::READ)
                .expect("user");
        }
        for id in [20, 10] {
            list.upsert_principal(AclTag::Group, id, AclPermissions::EXECUTE)
                .expect("group");
        }

        let keys: Vec<_> = list.entries().iter().map(AclEntry::sort_key).collect();
        assert_eq!(
            keys,
            vec![
                (AclTag::UserObj, ACL_UNDEFINED_ID),
                (AclTag::User, 1001),
                (AclTag::User, 1002),
                (AclTag::User, 1003),
                (AclTag::GroupObj, ACL_UNDEFINED_ID),
                (AclTag::Group, 10),
                (AclTag::Group, 20),
                (AclTag::Mask, ACL_UNDEFINED_ID),
                (AclTag::Other, ACL_UNDEFINED_ID),
            ]
        );
    }

    #[test]
    fn group_upsert_writes_group_tag() {
        let mut list = implicit_640();
        let index = list
            .upsert_principal(AclTag::Group, 33, AclPermissions::READ_WRITE)
            .expect("group");
        assert_eq!(list.entries()[index].tag(), AclTag::Group);
        assert_eq!(index, 2);
        assert!(list.get(AclTag::User, 33).is_none());
    }

    #[test]
    fn upsert_into_empty_list_is_rejected() {
        let mut list = AclList::new();
        let error = list
            .upsert_principal(AclTag::Group, 5, AclPermissions::READ)
            .expect_err("empty list has no structural entries");
        assert!(matches!(error, AclError::InvariantViolation(_)));
        assert!(list.is_empty());
    }

    #[test]
    fn mixed_sequences_stay_sorted_and_unique() {
        let mut list = implicit_640();
        let operations = [
            (AclTag::Group, 7, AclPermissions::READ),
            (AclTag::User, 9, AclPermissions::WRITE),
            (AclTag::User, 2, AclPermissions::ALL),
            (AclTag::Group, 7, AclPermissions::NONE),
            (AclTag::Group, 1, AclPermissions::READ),
            (AclTag::User, 9, AclPermissions::READ),
            (AclTag::User, 0, AclPermissions::EXECUTE),
            (AclTag::Group, 1_000_000, AclPermissions::READ),
        ];
        for (tag, id, permissions) in operations {
            list.upsert_principal(tag, id, permissions).expect("upsert");
            assert_sorted_unique(&list);
        }
        assert_eq!(list.len(), 4 + 6);
        assert!(list.validate().is_ok());
    }

    #[test]
    fn upsert_rejects_structural_tags() {
        let mut list = implicit_640();
        let error = list
            .upsert_principal(AclTag::Mask, ACL_UNDEFINED_ID, AclPermissions::ALL)
            .expect_err("mask is not a principal");
        assert!(matches!(error, AclError::InvariantViolation(_)));
        assert_eq!(list, implicit_640());
    }

    #[test]
    fn upsert_rejects_undefined_id_for_principal() {
        let mut list = implicit_640();
        assert!(
            list.upsert_principal(AclTag::User, ACL_UNDEFINED_ID, AclPermissions::READ)
                .is_err()
        );
    }

    #[test]
    fn recalculate_mask_covers_group_class() {
        let mut list = AclList::from_mode(0o644);
        list.upsert_principal(AclTag::User, 1001, AclPermissions::READ_WRITE)
            .expect("upsert");
        list.recalculate_mask();
        assert_eq!(
            list.structural(AclTag::Mask).map(AclEntry::permissions),
            Some(AclPermissions::READ_WRITE)
        );

        list.upsert_principal(AclTag::Group, 50, AclPermissions::EXECUTE)
            .expect("upsert");
        list.recalculate_mask();
        assert_eq!(
            list.structural(AclTag::Mask).map(AclEntry::permissions),
            Some(AclPermissions::ALL)
        );
    }

    #[test]
    fn recalculate_mask_inserts_missing_mask() {
        let mut list = AclList::from_entries(vec![
            AclEntry::structural(AclTag::UserObj, AclPermissions::ALL),
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
            AclEntry::group(12, AclPermissions::WRITE),
        ]);
        assert!(list.validate().is_err());
        list.recalculate_mask();
        assert_eq!(list.entries()[3].tag(), AclTag::Mask);
        assert_eq!(list.entries()[3].permissions(), AclPermissions::READ_WRITE);
        assert!(list.validate().is_ok());
    }

    #[test]
    fn recalculate_mask_leaves_minimal_list_without_mask() {
        let mut list = AclList::from_entries(vec![
            AclEntry::structural(AclTag::UserObj, AclPermissions::ALL),
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
        ]);
        list.recalculate_mask();
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn remove_principal_only_removes_named_entries() {
        let mut list = implicit_640();
        list.upsert_principal(AclTag::User, 1001, AclPermissions::READ)
            .expect("upsert");
        assert!(list.remove_principal(AclTag::User, 1001));
        assert!(!list.remove_principal(AclTag::User, 1001));
        assert!(!list.remove_principal(AclTag::Other, ACL_UNDEFINED_ID));
        assert_eq!(list, implicit_640());
    }

    #[test]
    fn minimal_detection() {
        let mut list = implicit_640();
        assert!(list.is_minimal());
        list.upsert_principal(AclTag::User, 1, AclPermissions::READ)
            .expect("upsert");
        assert!(!list.is_minimal());
        list.remove_principal(AclTag::User, 1);
        list.recalculate_mask();
        assert!(list.is_minimal());
    }

    #[test]
    fn validate_rejects_defined_id_on_structural_entry() {
        let list = AclList::from_entries_unchecked(vec![
            AclEntry::new(AclTag::UserObj, AclPermissions::ALL, 0),
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
        ]);
        assert!(matches!(
            list.validate(),
            Err(AclError::InvariantViolation(_))
        ));
    }

    #[test]
    fn validate_rejects_unsorted_and_duplicate_entries() {
        let unsorted = AclList::from_entries_unchecked(vec![
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::UserObj, AclPermissions::ALL),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
        ]);
        assert!(unsorted.validate().is_err());

        let duplicate = AclList::from_entries(vec![
            AclEntry::structural(AclTag::UserObj, AclPermissions::ALL),
            AclEntry::user(5, AclPermissions::READ),
            AclEntry::user(5, AclPermissions::WRITE),
            AclEntry::structural(AclTag::GroupObj, AclPermissions::READ),
            AclEntry::structural(AclTag::Mask, AclPermissions::READ),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
        ]);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn validate_requires_structural_entries() {
        let list = AclList::from_entries(vec![
            AclEntry::structural(AclTag::UserObj, AclPermissions::ALL),
            AclEntry::structural(AclTag::Other, AclPermissions::NONE),
        ]);
        assert!(list.validate().is_err());
        assert!(AclList::new().validate().is_ok());
    }

    #[test]
    fn display_lists_entries_in_order() {
        assert_eq!(
            implicit_640().to_string(),
            "user::rw-\ngroup::r--\nmask::r--\nother::---\n"
        );
    }

    #[derive(Clone, Copy, Debug)]
    enum Edit {
        Upsert(AclTag, u32, AclPermissions),
        Remove(AclTag, u32),
    }

    fn principal_tag() -> impl Strategy<Value = AclTag> {
        prop_oneof![Just(AclTag::User), Just(AclTag::Group)]
    }

    // Small ids collide often; the high range sits next to the undefined id.
    fn principal_id() -> impl Strategy<Value = u32> {
        prop_oneof![0u32..32, (ACL_UNDEFINED_ID - 8)..ACL_UNDEFINED_ID]
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            3 => (principal_tag(), principal_id(), 0u32..8).prop_map(|(tag, id, bits)| {
                Edit::Upsert(tag, id, AclPermissions::from_bits_truncate(bits))
            }),
            1 => (principal_tag(), principal_id()).prop_map(|(tag, id)| Edit::Remove(tag, id)),
        ]
    }

    proptest! {
        #[test]
        fn random_edits_keep_list_valid_and_encodable(
            mode in 0u32..0o10000,
            edits in prop::collection::vec(edit(), 1..=48),
        ) {
            let mut list = AclList::from_mode(mode);
            prop_assert!(list.validate().is_ok());

            for edit in &edits {
                match *edit {
                    Edit::Upsert(tag, id, permissions) => {
                        let index = list.upsert_principal(tag, id, permissions).expect("upsert");
                        let written = AclEntry::new(tag, permissions, id);
                        prop_assert_eq!(list.entries()[index], written);
                    }
                    Edit::Remove(tag, id) => {
                        let existed = list.get(tag, id).is_some();
                        prop_assert_eq!(list.remove_principal(tag, id), existed);
                        prop_assert!(list.get(tag, id).is_none());
                    }
                }
                list.recalculate_mask();

                prop_assert!(list.validate().is_ok(), "{:?} after {:?}", list, edit);
                for pair in list.entries().windows(2) {
                    prop_assert!(pair[0].sort_key() < pair[1].sort_key());
                }
                let decoded = codec::decode(&codec::encode(&list)).expect("decode");
                prop_assert_eq!(&decoded, &list);
            }
        }

        #[test]
        fn mask_covers_group_class_after_edits(
            mode in 0u32..0o10000,
            edits in prop::collection::vec(edit(), 1..=32),
        ) {
            let mut list = AclList::from_mode(mode);
            for edit in &edits {
                match *edit {
                    Edit::Upsert(tag, id, permissions) => {
                        list.upsert_principal(tag, id, permissions).expect("upsert");
                    }
                    Edit::Remove(tag, id) => {
                        list.remove_principal(tag, id);
                    }
                }
                list.recalculate_mask();
            }

            let union = list
                .entries()
                .iter()
                .filter(|entry| entry.tag().is_group_class())
                .fold(AclPermissions::NONE, |acc, entry| acc | entry.permissions());
            prop_assert_eq!(
                list.structural(AclTag::Mask).map(AclEntry::permissions),
                Some(union)
            );
            let has_named = list.entries().iter().any(|entry| entry.tag().is_principal());
            prop_assert_eq!(list.is_minimal(), !has_named);
        }
    }
}
