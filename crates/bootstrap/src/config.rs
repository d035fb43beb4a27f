use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use acl::{AclPermissions, ParsePermissionsError, PrincipalKind};

/// Environment variable selecting the deployment mode.
pub const APP_ENV_VAR: &str = "APP_ENV";
/// Environment variable overriding the socket path.
pub const SOCKET_PATH_VAR: &str = "SOCKET_PATH";
/// Environment variable naming the user that needs socket access.
pub const SOCKET_ACCESS_USER_VAR: &str = "SOCKET_ACCESS_USER";
/// Environment variable naming the group that needs socket access.
pub const SOCKET_ACCESS_GROUP_VAR: &str = "SOCKET_ACCESS_GROUP";
/// Environment variable overriding the permissions granted.
pub const SOCKET_ACCESS_PERMS_VAR: &str = "SOCKET_ACCESS_PERMS";

/// Socket path used in development.
pub const DEVELOPMENT_SOCKET_PATH: &str = "/tmp/steam-auth.sock";
/// Socket path used in staging and production.
pub const DEPLOYED_SOCKET_PATH: &str = "/var/run/steam-auth/steam-auth.sock";
/// Principal granted access unless configured otherwise.
pub const DEFAULT_PRINCIPAL: &str = "nginx";

/// Errors raised while reading the socket configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `APP_ENV` holds a value other than the three known modes.
    #[error("APP_ENV value '{value}' is not acceptable")]
    UnknownAppEnv {
        /// The rejected value.
        value: String,
    },

    /// Both a user and a group were named as the socket principal.
    #[error("SOCKET_ACCESS_USER and SOCKET_ACCESS_GROUP are mutually exclusive")]
    ConflictingPrincipal,

    /// A variable is set but empty where a value is required.
    #[error("{var} is set but empty")]
    EmptyValue {
        /// Variable name.
        var: &'static str,
    },

    /// The permission override does not parse.
    #[error("{var}: {source}")]
    InvalidPermissions {
        /// Variable name.
        var: &'static str,
        /// Parse failure.
        #[source]
        source: ParsePermissionsError,
    },
}

/// Deployment mode of the service owning the socket.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum AppEnv {
    /// Run by a developer who can change the socket's group.
    #[default]
    Development,
    /// Pre-production deployment.
    Staging,
    /// Production deployment.
    Production,
}

impl AppEnv {
    /// Lower-case name as accepted in `APP_ENV`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    /// Socket path used when `SOCKET_PATH` is not set.
    #[must_use]
    pub const fn default_socket_path(self) -> &'static str {
        match self {
            Self::Development => DEVELOPMENT_SOCKET_PATH,
            Self::Staging | Self::Production => DEPLOYED_SOCKET_PATH,
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Self::Development, Self::Staging, Self::Production]
            .into_iter()
            .find(|env| env.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ConfigError::UnknownAppEnv {
                value: value.to_owned(),
            })
    }
}

/// A user or group identified by name.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Principal {
    kind: PrincipalKind,
    name: String,
}

impl Principal {
    /// Names a user.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::User,
            name: name.into(),
        }
    }

    /// Names a group.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::Group,
            name: name.into(),
        }
    }

    /// Whether this is a user or a group.
    #[must_use]
    pub const fn kind(&self) -> PrincipalKind {
        self.kind
    }

    /// The principal's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}

/// Where the socket lives and who must be able to use it.
///
/// Built once at startup, usually by [`SocketConfig::from_env`], and passed to
/// [`configure_socket`](crate::configure_socket).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SocketConfig {
    app_env: AppEnv,
    socket_path: PathBuf,
    principal: Principal,
    permissions: AclPermissions,
}

impl SocketConfig {
    /// Creates the default configuration for `app_env`: the mode's socket
    /// path with `rw-` granted to the `nginx` user.
    #[must_use]
    pub fn new(app_env: AppEnv) -> Self {
        Self {
            app_env,
            socket_path: PathBuf::from(app_env.default_socket_path()),
            principal: Principal::user(DEFAULT_PRINCIPAL),
            permissions: AclPermissions::READ_WRITE,
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// An unset or empty `APP_ENV` selects development.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = match lookup(APP_ENV_VAR) {
            Some(value) if !value.is_empty() => value.parse()?,
            _ => AppEnv::Development,
        };
        let mut config = Self::new(app_env);

        if let Some(path) = lookup(SOCKET_PATH_VAR) {
            if path.is_empty() {
                return Err(ConfigError::EmptyValue {
                    var: SOCKET_PATH_VAR,
                });
            }
            config = config.with_socket_path(path);
        }

        let principal = match (
            non_empty(&lookup, SOCKET_ACCESS_USER_VAR)?,
            non_empty(&lookup, SOCKET_ACCESS_GROUP_VAR)?,
        ) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingPrincipal),
            (Some(user), None) => Some(Principal::user(user)),
            (None, Some(group)) => Some(Principal::group(group)),
            (None, None) => None,
        };
        if let Some(principal) = principal {
            config = config.with_principal(principal);
        }

        if let Some(text) = non_empty(&lookup, SOCKET_ACCESS_PERMS_VAR)? {
            let permissions =
                text.parse()
                    .map_err(|source| ConfigError::InvalidPermissions {
                        var: SOCKET_ACCESS_PERMS_VAR,
                        source,
                    })?;
            config = config.with_permissions(permissions);
        }

        Ok(config)
    }

    /// Replaces the socket path.
    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Replaces the principal that needs access.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    /// Replaces the permissions granted.
    #[must_use]
    pub const fn with_permissions(mut self, permissions: AclPermissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// Deployment mode.
    #[must_use]
    pub const fn app_env(&self) -> AppEnv {
        self.app_env
    }

    /// Path of the socket to configure.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Principal that needs access.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Permissions granted to the principal.
    #[must_use]
    pub const fn permissions(&self) -> AclPermissions {
        self.permissions
    }
}

fn non_empty<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if value.is_empty() => Err(ConfigError::EmptyValue { var }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<SocketConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        SocketConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_development() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config.app_env(), AppEnv::Development);
        assert_eq!(config.socket_path(), Path::new("/tmp/steam-auth.sock"));
        assert_eq!(config.principal(), &Principal::user("nginx"));
        assert_eq!(config.permissions(), AclPermissions::READ_WRITE);
    }

    #[test]
    fn empty_app_env_means_development() {
        let config = config_from(&[("APP_ENV", "")]).expect("config");
        assert_eq!(config.app_env(), AppEnv::Development);
    }

    #[test]
    fn app_env_is_case_insensitive() {
        let config = config_from(&[("APP_ENV", "Production")]).expect("config");
        assert_eq!(config.app_env(), AppEnv::Production);
        assert_eq!(
            config.socket_path(),
            Path::new("/var/run/steam-auth/steam-auth.sock")
        );
        assert_eq!("STAGING".parse::<AppEnv>().expect("parse"), AppEnv::Staging);
    }

    #[test]
    fn unknown_app_env_is_rejected() {
        let error = config_from(&[("APP_ENV", "qa")]).expect_err("unknown");
        assert!(matches!(error, ConfigError::UnknownAppEnv { ref value } if value == "qa"));
        assert_eq!(error.to_string(), "APP_ENV value 'qa' is not acceptable");
    }

    #[test]
    fn overrides_apply() {
        let config = config_from(&[
            ("APP_ENV", "staging"),
            ("SOCKET_PATH", "/run/app.sock"),
            ("SOCKET_ACCESS_GROUP", "www-data"),
            ("SOCKET_ACCESS_PERMS", "r"),
        ])
        .expect("config");
        assert_eq!(config.socket_path(), Path::new("/run/app.sock"));
        assert_eq!(config.principal().kind(), PrincipalKind::Group);
        assert_eq!(config.principal().name(), "www-data");
        assert_eq!(config.permissions(), AclPermissions::READ);
    }

    #[test]
    fn user_and_group_conflict() {
        let error = config_from(&[
            ("SOCKET_ACCESS_USER", "nginx"),
            ("SOCKET_ACCESS_GROUP", "nginx"),
        ])
        .expect_err("conflict");
        assert!(matches!(error, ConfigError::ConflictingPrincipal));
    }

    #[test]
    fn empty_override_is_rejected() {
        let error = config_from(&[("SOCKET_PATH", "")]).expect_err("empty");
        assert!(matches!(
            error,
            ConfigError::EmptyValue {
                var: "SOCKET_PATH"
            }
        ));
    }

    #[test]
    fn bad_permissions_are_rejected() {
        let error = config_from(&[("SOCKET_ACCESS_PERMS", "rwz")]).expect_err("bad perms");
        assert!(matches!(error, ConfigError::InvalidPermissions { .. }));
    }

    #[test]
    fn builders_replace_fields() {
        let config = SocketConfig::new(AppEnv::Production)
            .with_socket_path("/srv/s.sock")
            .with_principal(Principal::group("proxy"))
            .with_permissions(AclPermissions::ALL);
        assert_eq!(config.socket_path(), Path::new("/srv/s.sock"));
        assert_eq!(config.principal().to_string(), "group proxy");
        assert_eq!(config.permissions(), AclPermissions::ALL);
    }
}
