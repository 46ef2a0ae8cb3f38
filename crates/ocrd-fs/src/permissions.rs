use crate::{Error, Result};
use std::path::Path;

/// Mode bits of a new file before the umask applies. Other users never get
/// write access, whatever the umask.
pub const DEFAULT_FILE_MODE: u32 = 0o664;

/// File permission policy for atomic writes.
///
/// The replacement file of an atomic write is a fresh inode, so without an
/// explicit policy it would lose whatever mode the previous file carried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Keep the mode of the file being replaced.
    ///
    /// On Unix: if the target does not exist yet, the mode is
    /// `0o664 & !umask`.
    /// On Windows: nothing is applied.
    #[default]
    Preserve,

    /// Explicit Unix mode bits. On Windows only the write bits are honored.
    Custom(u32),
}

impl PermissionMode {
    /// Compute the mode bits the file at `target` should end up with.
    ///
    /// Returns `None` when nothing needs to be applied (non-Unix platforms
    /// with [`PermissionMode::Preserve`]).
    pub fn resolve(self, target: &Path) -> Result<Option<u32>> {
        let mode = match self {
            Self::Preserve => return preserved_mode(target),
            Self::Custom(mode) => mode,
        };
        Ok(Some(mode))
    }

    /// Apply the resolved mode of `target` to `path`.
    pub fn apply(self, path: &Path, target: &Path) -> Result<()> {
        match self.resolve(target)? {
            Some(mode) => set_mode(path, mode),
            None => Ok(()),
        }
    }
}

#[cfg(unix)]
fn preserved_mode(target: &Path) -> Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;

    match std::fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions().mode() & 0o7777)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Some(new_file_mode())),
        Err(e) => Err(Error::Metadata {
            path: target.to_path_buf(),
            source: e,
        }),
    }
}

#[cfg(not(unix))]
fn preserved_mode(_target: &Path) -> Result<Option<u32>> {
    Ok(None)
}

/// Mode a newly created regular file gets under the current umask.
#[cfg(unix)]
pub fn new_file_mode() -> u32 {
    mode_under_umask(current_umask())
}

#[cfg(unix)]
fn mode_under_umask(umask: u32) -> u32 {
    DEFAULT_FILE_MODE & !umask
}

/// Query the process umask.
///
/// The only way to read the umask is to set it, so the value is swapped out
/// and restored immediately under a lock. Other threads calling `umask(2)`
/// directly can still race with this window.
#[cfg(unix)]
pub fn current_umask() -> u32 {
    use nix::sys::stat::{Mode, umask};
    use std::sync::Mutex;

    static UMASK_LOCK: Mutex<()> = Mutex::new(());

    let _guard = UMASK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let old = umask(Mode::empty());
    umask(old);
    old.bits() as u32
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        Error::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

#[cfg(not(unix))]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    let meta = std::fs::metadata(path).map_err(|e| Error::Metadata {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut perms = meta.permissions();
    perms.set_readonly(mode & 0o222 == 0);
    std::fs::set_permissions(path, perms).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
