//! The ACL implied by mode bits alone.

use crate::entry::AclEntry;
use crate::list::AclList;
use crate::mode::PermissionClass;
use crate::tag::AclTag;

impl AclList {
    /// Derives the four-entry ACL equivalent to `mode`.
    ///
    /// `UserObj`, `GroupObj` and `Other` take the owner, group and other
    /// fields of the mode. `Mask` starts equal to the group field, which is
    /// the union of the only group-class entry present; adding named entries
    /// later widens it through [`AclList::recalculate_mask`].
    #[must_use]
    pub fn from_mode(mode: u32) -> Self {
        let owner = PermissionClass::Owner.extract(mode);
        let group = PermissionClass::Group.extract(mode);
        let other = PermissionClass::Other.extract(mode);

        Self::from_entries_unchecked(vec![
            AclEntry::structural(AclTag::UserObj, owner),
            AclEntry::structural(AclTag::GroupObj, group),
            AclEntry::structural(AclTag::Mask, group),
            AclEntry::structural(AclTag::Other, other),
        ])
    }
}
