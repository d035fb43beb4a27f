use std::fmt::Write as _;

use crate::error::AclError;
use crate::id_lookup;
use crate::list::AclList;
use crate::node::FileNode;
use crate::tag::AclTag;
use crate::xattr::AclKind;

/// Renders a node's ACLs the way `getfacl` prints them.
///
/// ```text
/// # file: /var/run/steam-auth/steam-auth.sock
/// # owner: steamsvc
/// # group: steamsvc
/// user::rw-
/// user:nginx:rw-
/// group::r--
/// mask::rw-
/// other::r--
/// ```
///
/// Without a stored access ACL only the three entries the mode bits express
/// are printed, as `getfacl` does. Directory default entries follow with a
/// `default:` prefix.
pub fn getfacl_text(node: &FileNode) -> Result<String, AclError> {
    let mut text = String::new();
    let owner = id_lookup::user_name(node.uid()).unwrap_or_else(|| node.uid().to_string());
    let group = id_lookup::group_name(node.gid()).unwrap_or_else(|| node.gid().to_string());

    // Writing into a String cannot fail.
    let _ = writeln!(text, "# file: {}", node.path().display());
    let _ = writeln!(text, "# owner: {owner}");
    let _ = writeln!(text, "# group: {group}");

    let stored = node.read_acl(AclKind::Access)?;
    let implicit = stored.is_empty();
    let access = if implicit {
        AclList::from_mode(node.mode())
    } else {
        stored
    };
    for entry in access.entries() {
        if implicit && entry.tag() == AclTag::Mask {
            continue;
        }
        let _ = writeln!(text, "{entry}");
    }

    if node.is_dir() {
        for entry in node.read_acl(AclKind::Default)?.entries() {
            let _ = writeln!(text, "default:{entry}");
        }
    }

    Ok(text)
}
