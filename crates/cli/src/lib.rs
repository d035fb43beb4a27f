#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `sockacl` command-line front-end. It prints and edits
//! the POSIX ACLs of files through the [`acl`] crate and runs the socket
//! bootstrap from the [`bootstrap`] crate.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for standard
//! output and error, so tests drive the whole front-end with in-memory
//! buffers. A [`clap`](https://docs.rs/clap/) builder command parses the
//! arguments into one action, which is executed synchronously.
//!
//! | subcommand | effect |
//! |------------|--------|
//! | `get PATH` | print owner, group and ACLs in getfacl form |
//! | `grant [-d] user\|group NAME PERMS PATH` | add or replace a named entry |
//! | `chmod owner\|group\|other PERMS PATH` | rewrite one class of the mode bits |
//! | `revoke [-d] user\|group NAME PATH` | remove a named entry |
//! | `clear [-d] PATH` | remove the access (or default) ACL |
//! | `configure-socket` | run the socket bootstrap from the environment |
//!
//! # Errors
//!
//! Argument errors and failed operations are written to the error stream as a
//! single `sockacl: ...` line and yield exit code `1`. Help and version output
//! go to standard output with exit code `0`.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["sockacl", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8_lossy(&stdout).starts_with("sockacl "));
//! ```

mod command;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use acl::{AclError, AclTag, FileNode, getfacl_text, resolve_principal};
use bootstrap::{SocketConfig, SocketSetup};
use clap::error::ErrorKind;
use logging::VerbosityConfig;

use command::{Action, ParsedArgs, PROGRAM_NAME, parse_args};

/// Exit code reported for any failure.
pub const FAILURE_EXIT_CODE: i32 = 1;

const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Parses `arguments`, runs the requested subcommand and returns the exit
/// code.
///
/// Installs the tracing subscriber on first use.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => return report_clap_error(&error, stdout, stderr),
    };

    let _ = logging::init_tracing(VerbosityConfig::from_verbose_level(parsed.verbose));

    match execute(parsed, stdout) {
        Ok(()) => 0,
        Err(error) => {
            tracing::debug!(target: "sockacl::cli", ?error, "command failed");
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            FAILURE_EXIT_CODE
        }
    }
}

/// Like [`run`], converting the status into an [`ExitCode`] for `main`.
pub fn run_with<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> ExitCode
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    exit_code_from(run(arguments, stdout, stderr))
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> ExitCode {
    ExitCode::from(clamp_status(status))
}

fn clamp_status(status: i32) -> u8 {
    u8::try_from(status.clamp(0, MAX_EXIT_CODE)).unwrap_or(u8::MAX)
}

fn report_clap_error<Out, Err>(error: &clap::Error, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(stdout, "{}", error.render());
            0
        }
        _ => {
            let _ = write!(stderr, "{}", error.render());
            FAILURE_EXIT_CODE
        }
    }
}

/// Failures surfaced by a subcommand.
#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Acl(#[from] AclError),
    #[error("invalid socket configuration: {0}")]
    Config(#[from] bootstrap::ConfigError),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

fn execute<Out: Write>(parsed: ParsedArgs, stdout: &mut Out) -> Result<(), CommandError> {
    match parsed.action {
        Action::Get { path } => {
            let node = FileNode::open(path)?;
            stdout.write_all(getfacl_text(&node)?.as_bytes())?;
        }
        Action::Grant {
            kind,
            principal,
            name,
            permissions,
            path,
        } => {
            let id = resolve_principal(principal, &name)?;
            let mut node = FileNode::open(path)?;
            let list = node.grant(kind, AclTag::from(principal), id, permissions)?;
            tracing::info!(
                target: "sockacl::cli",
                path = %node.path().display(),
                %kind,
                %principal,
                name,
                %permissions,
                entries = list.len(),
                "granted"
            );
        }
        Action::Chmod {
            class,
            permissions,
            path,
        } => {
            let mut node = FileNode::open(path)?;
            node.set_class_permissions(class, permissions)?;
            tracing::info!(
                target: "sockacl::cli",
                path = %node.path().display(),
                mode = format_args!("{:o}", node.permission_bits()),
                "mode changed"
            );
        }
        Action::Revoke {
            kind,
            principal,
            name,
            path,
        } => {
            let id = resolve_principal(principal, &name)?;
            let mut node = FileNode::open(path)?;
            if !node.revoke(kind, AclTag::from(principal), id)? {
                tracing::warn!(
                    target: "sockacl::cli",
                    path = %node.path().display(),
                    %kind,
                    %principal,
                    name,
                    "no matching entry"
                );
            }
        }
        Action::Clear { kind, path } => {
            let mut node = FileNode::open(path)?;
            match kind {
                acl::AclKind::Access => node.clear_access_acl()?,
                acl::AclKind::Default => node.remove_default_acl()?,
            }
        }
        Action::ConfigureSocket => {
            let config = SocketConfig::from_env()?;
            let path = config.socket_path().display();
            match bootstrap::configure_socket(&config)? {
                SocketSetup::GroupChanged { gid } => {
                    writeln!(stdout, "{path}: group set to {gid}")?;
                }
                SocketSetup::AccessGranted { .. } => {
                    writeln!(
                        stdout,
                        "{path}: granted {} {}",
                        config.principal(),
                        config.permissions()
                    )?;
                }
            }
        }
    }
    Ok(())
}
