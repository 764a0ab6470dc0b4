//! User/group switching for locally-executed commands. Unix-only: looks
//! up uid/gid by name and drops privileges via `setuid`/`setgid` on the
//! child process.

#[cfg(unix)]
use crate::error::ConnectionError;

#[cfg(unix)]
pub fn lookup_uid_gid(user: &str) -> Result<(u32, u32), ConnectionError> {
    let found = nix::unistd::User::from_name(user)
        .map_err(|_| ConnectionError::UnknownUser { user: user.to_string() })?
        .ok_or_else(|| ConnectionError::UnknownUser { user: user.to_string() })?;
    Ok((found.uid.as_raw(), found.gid.as_raw()))
}

#[cfg(unix)]
pub fn lookup_gid(group: &str) -> Result<u32, ConnectionError> {
    let found = nix::unistd::Group::from_name(group)
        .map_err(|_| ConnectionError::UnknownGroup { group: group.to_string() })?
        .ok_or_else(|| ConnectionError::UnknownGroup { group: group.to_string() })?;
    Ok(found.gid.as_raw())
}

/// Applies `user`/`group` to `cmd` via `uid`/`gid`, resolving group from
/// the user's primary group when `group` is not given. A no-op when
/// `user` is empty: run as the current user.
#[cfg(unix)]
pub fn apply(cmd: &mut tokio::process::Command, user: Option<&str>, group: Option<&str>) -> Result<(), ConnectionError> {
    use std::os::unix::process::CommandExt;

    let Some(user) = user.filter(|u| !u.is_empty()) else {
        return Ok(());
    };

    let (uid, default_gid) = lookup_uid_gid(user)?;
    let gid = match group.filter(|g| !g.is_empty()) {
        Some(group) => lookup_gid(group)?,
        None => default_gid,
    };

    cmd.uid(uid);
    cmd.gid(gid);
    Ok(())
}

#[cfg(not(unix))]
pub fn apply(
    _cmd: &mut tokio::process::Command,
    _user: Option<&str>,
    _group: Option<&str>,
) -> Result<(), crate::error::ConnectionError> {
    Ok(())
}
