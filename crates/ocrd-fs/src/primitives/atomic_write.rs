use crate::permissions::PermissionMode;
use crate::{Error, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{instrument, trace};

#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub permissions: PermissionMode,
    pub sync: bool,
    pub create_parents: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            permissions: PermissionMode::Preserve,
            sync: true,
            create_parents: false,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: PermissionMode) -> Self {
        self.permissions = mode;
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
    pub fn create_parents(mut self, create_parents: bool) -> Self {
        self.create_parents = create_parents;
        self
    }
}

/// Replace `path` with `content` so that readers see either the old or the
/// new file, never a partial one.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8], options: Options) -> Result<()> {
    atomic_write_from(path, content, options).map(|_| ())
}

/// Streaming variant of [`atomic_write`]. Returns the number of bytes written.
#[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub fn atomic_write_from(
    path: impl AsRef<Path>,
    mut reader: impl Read,
    options: Options,
) -> Result<u64> {
    let path = path.as_ref();
    let parent = parent_dir(path)?;

    if options.create_parents {
        fs::create_dir_all(&parent).map_err(|e| Error::CreateDir {
            path: parent.clone(),
            source: e,
        })?;
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(".tmp.")
        .suffix(".ocrd")
        .tempfile_in(&parent)
        .map_err(|e| Error::Write {
            path: parent.clone(),
            source: e,
        })?;

    let written = std::io::copy(&mut reader, tmp.as_file_mut()).map_err(|e| Error::Write {
        path: tmp.path().to_path_buf(),
        source: e,
    })?;
    tmp.as_file_mut().flush().map_err(|e| Error::Write {
        path: tmp.path().to_path_buf(),
        source: e,
    })?;

    options.permissions.apply(tmp.path(), path)?;

    if options.sync {
        tmp.as_file().sync_all().map_err(|e| Error::Write {
            path: tmp.path().to_path_buf(),
            source: e,
        })?;
    }

    // On failure the temp file is handed back and removed when dropped.
    tmp.persist(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    if options.sync {
        sync_dir(&parent);
    }

    trace!(bytes = written, "atomically replaced file");
    Ok(written)
}

pub fn atomic_read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parent_dir(path: &Path) -> Result<PathBuf> {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Ok(PathBuf::from(".")),
        Some(parent) => Ok(parent.to_path_buf()),
        None => Err(Error::NoParent {
            path: path.to_path_buf(),
        }),
    }
}

// Directory fsync is best effort; not every filesystem supports it.
#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = fs::File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"hello world", Options::new()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, "old content that is longer").unwrap();
        atomic_write(&path, b"new", Options::new()).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        atomic_write(&path, b"data", Options::new()).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["test.txt".to_string()]);
    }

    #[test]
    fn test_atomic_write_missing_parent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("test.txt");
        let err = atomic_write(&path, b"data", Options::new()).unwrap_err();
        assert!(err.is_not_found());
        assert!(!path.exists());
    }

    #[test]
    fn test_atomic_write_create_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("test.txt");
        atomic_write(&path, b"data", Options::new().create_parents(true)).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn test_atomic_write_from_reader() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("streamed");
        let n = atomic_write_from(&path, &b"streamed bytes"[..], Options::new()).unwrap();
        assert_eq!(n, 14);
        assert_eq!(atomic_read(&path).unwrap(), b"streamed bytes");
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("script.sh");
        fs::write(&path, "#!/bin/sh").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o750)).unwrap();

        atomic_write(&path, b"#!/bin/sh\necho hi", Options::new()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_new_file_follows_umask() {
        use crate::permissions::current_umask;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh");
        atomic_write(&path, b"data", Options::new()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664 & !current_umask());
    }

    #[cfg(unix)]
    #[test]
    fn test_atomic_write_with_custom_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.txt");
        let options = Options::new().permissions(PermissionMode::Custom(0o755));
        atomic_write(&path, b"data", options).unwrap();
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o755);
    }
}
