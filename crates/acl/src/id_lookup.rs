//! User and group database lookups.
//!
//! Uses the reentrant `getpwnam_r`/`getgrnam_r`/`getpwuid_r`/`getgrgid_r`
//! family so lookups are safe from any thread. Each call starts with a 4 KiB
//! scratch buffer and doubles it on `ERANGE`, up to 1 MiB.

use std::ffi::{CStr, CString};
use std::io;
use std::mem::MaybeUninit;
use std::ptr;

use crate::error::{AclError, PrincipalKind};

const INITIAL_BUFFER: usize = 4096;
const MAX_BUFFER: usize = 1024 * 1024;

fn retry_on_erange<T>(
    mut call: impl FnMut(&mut [u8]) -> Result<Option<T>, i32>,
) -> io::Result<Option<T>> {
    let mut buffer = vec![0_u8; INITIAL_BUFFER];
    loop {
        match call(&mut buffer) {
            Ok(value) => return Ok(value),
            Err(libc::ERANGE) => {
                let grown = buffer.len().saturating_mul(2);
                if grown > MAX_BUFFER {
                    return Err(io::Error::new(
                        io::ErrorKind::OutOfMemory,
                        "user/group database record too large",
                    ));
                }
                buffer.resize(grown, 0);
            }
            // Several libcs report "no such entry" through errno.
            Err(libc::ENOENT | libc::ESRCH) => return Ok(None),
            Err(errno) => return Err(io::Error::from_raw_os_error(errno)),
        }
    }
}

/// Looks up the uid for `name`.
#[allow(unsafe_code)]
pub fn lookup_user_by_name(name: &str) -> io::Result<Option<u32>> {
    let Ok(c_name) = CString::new(name) else {
        return Ok(None);
    };

    retry_on_erange(|buffer| {
        let mut pwd = MaybeUninit::<libc::passwd>::zeroed();
        let mut result: *mut libc::passwd = ptr::null_mut();
        // SAFETY: `c_name` is a valid C string, `pwd` and `result` are valid
        // out-pointers and `buffer` outlives the call.
        let errno = unsafe {
            libc::getpwnam_r(
                c_name.as_ptr(),
                pwd.as_mut_ptr(),
                buffer.as_mut_ptr().cast::<libc::c_char>(),
                buffer.len(),
                &mut result,
            )
        };
        if errno != 0 {
            return Err(errno);
        }
        if result.is_null() {
            return Ok(None);
        }
        // SAFETY: a non-null `result` means `pwd` was initialised.
        let pwd = unsafe { pwd.assume_init() };
        Ok(Some(pwd.pw_uid))
    })
}

/// Looks up the gid for `name`.
#[allow(unsafe_code)]
pub fn lookup_group_by_name(name: &str) -> io::Result<Option<u32>> {
    let Ok(c_name) = CString::new(name) else {
        return Ok(None);
    };

    retry_on_erange(|buffer| {
        let mut grp = MaybeUninit::<libc::group>::zeroed();
        let mut result: *mut libc::group = ptr::null_mut();
        // SAFETY: see `lookup_user_by_name`.
        let errno = unsafe {
            libc::getgrnam_r(
                c_name.as_ptr(),
                grp.as_mut_ptr(),
                buffer.as_mut_ptr().cast::<libc::c_char>(),
                buffer.len(),
                &mut result,
            )
        };
        if errno != 0 {
            return Err(errno);
        }
        if result.is_null() {
            return Ok(None);
        }
        // SAFETY: a non-null `result` means `grp` was initialised.
        let grp = unsafe { grp.assume_init() };
        Ok(Some(grp.gr_gid))
    })
}

/// Looks up the login name of `uid`.
#[allow(unsafe_code)]
pub fn lookup_user_name(uid: u32) -> io::Result<Option<String>> {
    retry_on_erange(|buffer| {
        let mut pwd = MaybeUninit::<libc::passwd>::zeroed();
        let mut result: *mut libc::passwd = ptr::null_mut();
        // SAFETY: `pwd` and `result` are valid out-pointers and `buffer`
        // outlives the call.
        let errno = unsafe {
            libc::getpwuid_r(
                uid,
                pwd.as_mut_ptr(),
                buffer.as_mut_ptr().cast::<libc::c_char>(),
                buffer.len(),
                &mut result,
            )
        };
        if errno != 0 {
            return Err(errno);
        }
        if result.is_null() {
            return Ok(None);
        }
        // SAFETY: `pwd` is initialised and `pw_name` points into `buffer`,
        // which is still borrowed here.
        let name = unsafe { CStr::from_ptr(pwd.assume_init().pw_name) };
        Ok(Some(name.to_string_lossy().into_owned()))
    })
}

/// Looks up the name of `gid`.
#[allow(unsafe_code)]
pub fn lookup_group_name(gid: u32) -> io::Result<Option<String>> {
    retry_on_erange(|buffer| {
        let mut grp = MaybeUninit::<libc::group>::zeroed();
        let mut result: *mut libc::group = ptr::null_mut();
        // SAFETY: see `lookup_user_name`.
        let errno = unsafe {
            libc::getgrgid_r(
                gid,
                grp.as_mut_ptr(),
                buffer.as_mut_ptr().cast::<libc::c_char>(),
                buffer.len(),
                &mut result,
            )
        };
        if errno != 0 {
            return Err(errno);
        }
        if result.is_null() {
            return Ok(None);
        }
        // SAFETY: see `lookup_user_name`.
        let name = unsafe { CStr::from_ptr(grp.assume_init().gr_name) };
        Ok(Some(name.to_string_lossy().into_owned()))
    })
}

/// Best-effort name for `uid`, used when rendering entries.
pub fn user_name(uid: u32) -> Option<String> {
    lookup_user_name(uid).ok().flatten()
}

/// Best-effort name for `gid`, used when rendering entries.
pub fn group_name(gid: u32) -> Option<String> {
    lookup_group_name(gid).ok().flatten()
}

/// Resolves a user or group name to its numeric id.
///
/// Names that are not in the database but parse as a number are accepted as
/// raw ids, matching `setfacl`.
pub fn resolve_principal(kind: PrincipalKind, name: &str) -> Result<u32, AclError> {
    let found = match kind {
        PrincipalKind::User => lookup_user_by_name(name),
        PrincipalKind::Group => lookup_group_by_name(name),
    }
    .map_err(|source| AclError::PrincipalLookup {
        kind,
        name: name.to_owned(),
        source,
    })?;

    if let Some(id) = found {
        tracing::trace!(target: "sockacl::acl", %kind, name, id, "resolved principal");
        return Ok(id);
    }

    name.parse::<u32>()
        .ok()
        .filter(|id| *id != crate::entry::ACL_UNDEFINED_ID)
        .ok_or_else(|| AclError::PrincipalResolution {
            kind,
            name: name.to_owned(),
        })
}
