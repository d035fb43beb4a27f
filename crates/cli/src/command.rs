use std::ffi::OsString;
use std::path::PathBuf;

use acl::{AclKind, AclPermissions, PermissionClass, PrincipalKind};
use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

pub(crate) const PROGRAM_NAME: &str = "sockacl";

/// One parsed invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct ParsedArgs {
    pub(crate) verbose: u8,
    pub(crate) action: Action,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Action {
    Get {
        path: PathBuf,
    },
    Grant {
        kind: AclKind,
        principal: PrincipalKind,
        name: String,
        permissions: AclPermissions,
        path: PathBuf,
    },
    Chmod {
        class: PermissionClass,
        permissions: AclPermissions,
        path: PathBuf,
    },
    Revoke {
        kind: AclKind,
        principal: PrincipalKind,
        name: String,
        path: PathBuf,
    },
    Clear {
        kind: AclKind,
        path: PathBuf,
    },
    ConfigureSocket,
}

fn path_arg() -> Arg {
    Arg::new("path")
        .value_name("PATH")
        .help("File or directory to operate on.")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn principal_args() -> [Arg; 2] {
    [
        Arg::new("principal")
            .value_name("user|group")
            .help("Whether NAME is a user or a group.")
            .required(true)
            .value_parser(["user", "group"]),
        Arg::new("name")
            .value_name("NAME")
            .help("User or group name, or a numeric id.")
            .required(true),
    ]
}

fn permissions_arg() -> Arg {
    Arg::new("permissions")
        .value_name("PERMS")
        .help("Permissions as rwx text (rw-, rw, r) or an octal digit.")
        .required(true)
        .value_parser(|text: &str| text.parse::<AclPermissions>())
}

fn default_flag(help: &'static str) -> Arg {
    Arg::new("default")
        .long("default")
        .short('d')
        .help(help)
        .action(ArgAction::SetTrue)
}

pub(crate) fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .about("Inspect and edit POSIX access control lists")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase logging verbosity; repeat for more detail.")
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand(
            Command::new("get")
                .about("Print the ACLs of PATH in getfacl form.")
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("grant")
                .about("Grant a named user or group permissions on PATH.")
                .arg(default_flag("Edit the default ACL of a directory."))
                .args(principal_args())
                .arg(permissions_arg())
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("chmod")
                .about("Set the owner, group or other permissions of PATH.")
                .arg(
                    Arg::new("class")
                        .value_name("owner|group|other")
                        .help("Permission class to change.")
                        .required(true)
                        .value_parser(|text: &str| text.parse::<PermissionClass>()),
                )
                .arg(permissions_arg())
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("revoke")
                .about("Remove the entry of a named user or group from PATH.")
                .arg(default_flag("Edit the default ACL of a directory."))
                .args(principal_args())
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("clear")
                .about("Remove the access ACL of PATH, leaving only the mode bits.")
                .arg(default_flag("Remove the default ACL instead."))
                .arg(path_arg()),
        )
        .subcommand(
            Command::new("configure-socket")
                .about("Grant the configured principal access to the service socket.")
                .long_about(
                    "Grant the configured principal access to the service socket.\n\n\
                     Reads APP_ENV, SOCKET_PATH, SOCKET_ACCESS_USER, SOCKET_ACCESS_GROUP \
                     and SOCKET_ACCESS_PERMS from the environment.",
                ),
        )
}

fn acl_kind(matches: &ArgMatches) -> AclKind {
    if matches.get_flag("default") {
        AclKind::Default
    } else {
        AclKind::Access
    }
}

fn principal_kind(matches: &ArgMatches) -> PrincipalKind {
    match matches.get_one::<String>("principal").map(String::as_str) {
        Some("group") => PrincipalKind::Group,
        _ => PrincipalKind::User,
    }
}

fn required<T: Clone + Send + Sync + 'static>(
    matches: &ArgMatches,
    id: &str,
) -> Result<T, clap::Error> {
    matches.get_one::<T>(id).cloned().ok_or_else(|| {
        clap::Error::raw(
            ErrorKind::MissingRequiredArgument,
            format!("missing required argument '{id}'\n"),
        )
    })
}

pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();

    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let matches = clap_command().try_get_matches_from(args)?;
    let verbose = matches.get_count("verbose");

    let action = match matches.subcommand() {
        Some(("get", sub)) => Action::Get {
            path: required(sub, "path")?,
        },
        Some(("grant", sub)) => Action::Grant {
            kind: acl_kind(sub),
            principal: principal_kind(sub),
            name: required(sub, "name")?,
            permissions: required(sub, "permissions")?,
            path: required(sub, "path")?,
        },
        Some(("chmod", sub)) => Action::Chmod {
            class: required(sub, "class")?,
            permissions: required(sub, "permissions")?,
            path: required(sub, "path")?,
        },
        Some(("revoke", sub)) => Action::Revoke {
            kind: acl_kind(sub),
            principal: principal_kind(sub),
            name: required(sub, "name")?,
            path: required(sub, "path")?,
        },
        Some(("clear", sub)) => Action::Clear {
            kind: acl_kind(sub),
            path: required(sub, "path")?,
        },
        Some(("configure-socket", _)) => Action::ConfigureSocket,
        _ => {
            return Err(clap::Error::raw(
                ErrorKind::MissingSubcommand,
                "a subcommand is required\n",
            ));
        }
    };

    Ok(ParsedArgs { verbose, action })
}
