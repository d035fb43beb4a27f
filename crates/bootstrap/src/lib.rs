#![deny(unsafe_code)]
#![deny(missing_docs)]

//! # Overview
//!
//! `bootstrap` runs once after the service has bound its Unix socket and makes
//! the socket reachable by the reverse proxy.
//!
//! # Design
//!
//! [`configure_socket`] looks at the [`SocketConfig`] deployment mode:
//!
//! - [`AppEnv::Development`]: the developer running the service can change the
//!   socket's group, so the group becomes the principal's name and the owner
//!   is kept.
//! - Staging and production: the principal is granted an access-ACL entry
//!   through [`grant_principal_access`].
//!
//! # Errors
//!
//! Everything below the configuration layer fails with [`AclError`];
//! [`ConfigError`] covers the environment read.

mod config;

use std::path::Path;

use acl::{AclError, AclKind, AclList, AclPermissions, AclTag, FileNode, PrincipalKind};

pub use config::{
    APP_ENV_VAR, AppEnv, ConfigError, DEFAULT_PRINCIPAL, DEPLOYED_SOCKET_PATH,
    DEVELOPMENT_SOCKET_PATH, Principal, SOCKET_ACCESS_GROUP_VAR, SOCKET_ACCESS_PERMS_VAR,
    SOCKET_ACCESS_USER_VAR, SOCKET_PATH_VAR, SocketConfig,
};

/// What [`configure_socket`] changed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SocketSetup {
    /// The socket's group was changed.
    GroupChanged {
        /// The new group id.
        gid: u32,
    },
    /// An access-ACL entry was written.
    AccessGranted {
        /// The access ACL as written.
        acl: AclList,
    },
}

/// Resolves `name` and grants it `permissions` on `socket_path` through the
/// access ACL.
///
/// Returns the access ACL that was written.
pub fn grant_principal_access(
    socket_path: &Path,
    kind: PrincipalKind,
    name: &str,
    permissions: AclPermissions,
) -> Result<AclList, AclError> {
    let id = acl::resolve_principal(kind, name)?;
    let mut node = FileNode::open(socket_path)?;
    let acl = node.grant(AclKind::Access, AclTag::from(kind), id, permissions)?;
    tracing::info!(
        target: "sockacl::bootstrap",
        path = %socket_path.display(),
        %kind,
        name,
        id,
        %permissions,
        "granted socket access"
    );
    Ok(acl)
}

/// Changes the group of `socket_path` to `group`, keeping the owner.
///
/// Returns the group id now set.
pub fn share_socket_group(socket_path: &Path, group: &str) -> Result<u32, AclError> {
    let gid = acl::resolve_principal(PrincipalKind::Group, group)?;
    acl::change_ownership(socket_path, None, Some(gid))?;
    tracing::info!(
        target: "sockacl::bootstrap",
        path = %socket_path.display(),
        group,
        gid,
        "changed socket group"
    );
    Ok(gid)
}

/// Makes the configured socket usable by the configured principal.
pub fn configure_socket(config: &SocketConfig) -> Result<SocketSetup, AclError> {
    let principal = config.principal();
    tracing::debug!(
        target: "sockacl::bootstrap",
        app_env = %config.app_env(),
        path = %config.socket_path().display(),
        %principal,
        "configuring socket"
    );

    match config.app_env() {
        AppEnv::Development => {
            let gid = share_socket_group(config.socket_path(), principal.name())?;
            Ok(SocketSetup::GroupChanged { gid })
        }
        AppEnv::Staging | AppEnv::Production => {
            let acl = grant_principal_access(
                config.socket_path(),
                principal.kind(),
                principal.name(),
                config.permissions(),
            )?;
            Ok(SocketSetup::AccessGranted { acl })
        }
    }
}
