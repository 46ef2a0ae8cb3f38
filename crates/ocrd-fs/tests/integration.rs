use ocrd_fs::path::{absolute_from, local_basename};
use ocrd_fs::{AtomicWriteOptions, atomic_copy, atomic_read, atomic_write};
use tempfile::tempdir;

#[test]
fn test_atomic_write_basic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("test.txt");

    atomic_write(&path, b"hello world", AtomicWriteOptions::new()).unwrap();

    assert!(path.exists());
    assert_eq!(atomic_read(&path).unwrap(), b"hello world");
}

#[test]
fn test_atomic_write_replaces_existing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.txt");

    std::fs::write(&path, "original").unwrap();

    atomic_write(&path, b"new content", AtomicWriteOptions::new()).unwrap();

    assert_eq!(atomic_read(&path).unwrap(), b"new content");
}

#[test]
fn test_repeated_writes_are_reentrant() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mets.xml");

    for round in 0..5 {
        let content = format!("<mets round=\"{round}\"/>");
        atomic_write(&path, content.as_bytes(), AtomicWriteOptions::new()).unwrap();
        assert_eq!(atomic_read(&path).unwrap(), content.as_bytes());
    }
}

#[cfg(unix)]
#[test]
fn test_atomic_write_into_readonly_directory_fails() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions.
    let marker = locked.join(".writable");
    if std::fs::write(&marker, "x").is_ok() {
        let _ = std::fs::remove_file(&marker);
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let target = locked.join("file.txt");
    let result = atomic_write(&target, b"data", AtomicWriteOptions::new());

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    assert!(result.is_err());
    assert!(!target.exists());
}

#[test]
fn test_copy_then_flatten_names() {
    let dir = tempdir().unwrap();
    let src = dir.path().join("src").join("data").join("mets.xml");
    std::fs::create_dir_all(src.parent().unwrap()).unwrap();
    std::fs::write(&src, "<mets/>").unwrap();

    let url = format!("file://{}", src.display());
    let dest = dir.path().join("dest").join(local_basename(&url, None, None));
    atomic_copy(&src, &dest, AtomicWriteOptions::new().create_parents(true)).unwrap();

    let name = dest.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("file."));
    assert!(name.ends_with(".src.data.mets.xml"));
    assert_eq!(atomic_read(&dest).unwrap(), b"<mets/>");
}

#[test]
fn test_absolute_from_keeps_absolute_paths() {
    let dir = tempdir().unwrap();
    let abs = dir.path().join("x");
    assert_eq!(absolute_from(std::path::Path::new("/elsewhere"), &abs), abs);
}
