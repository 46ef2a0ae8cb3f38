//! Turning `url` strings of a workspace descriptor into local paths.
//!
//! A descriptor location is either a remote URL (`scheme://...`), a
//! `file://` URL, or a bare filesystem path. Only the first kind needs the
//! network; the other two are resolved against a base directory.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

/// Scheme prefix of local-file URLs.
pub const FILE_SCHEME: &str = "file://";

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\_.\-]").expect("valid regex"));

/// Whether `url` needs to be fetched over the network.
pub fn is_remote_url(url: &str) -> bool {
    url.contains("://") && !url.starts_with(FILE_SCHEME)
}

/// Strip a leading `file://`, if present.
pub fn strip_file_scheme(url: &str) -> &str {
    url.strip_prefix(FILE_SCHEME).unwrap_or(url)
}

/// `file://` URL for a local path.
pub fn file_url(path: impl AsRef<Path>) -> String {
    format!("{}{}", FILE_SCHEME, path.as_ref().display())
}

/// Resolve a path or `file://` URL against the current working directory.
pub fn to_absolute(reference: &str) -> std::io::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(absolute_from(&cwd, strip_file_scheme(reference)))
}

/// Resolve `path` against `base` without touching the filesystem.
///
/// `..` above the root stays at the root, so arbitrarily deep relative
/// paths never fail.
pub fn absolute_from(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Lexically normalize `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(component.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}

/// Flatten `url` into a single file name.
///
/// The scheme (`file` for bare paths) is followed by the rest of the URL with
/// every `/`, `\`, `_`, `.` and `-` replaced by a dot, one for one:
/// `file:///tmp/a_b/data/mets.xml` becomes `file.tmp.a.b.data.mets.xml`.
/// Files from different source trees thus do not collide when flattened
/// into a single directory.
pub fn safe_filename(url: &str) -> String {
    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) if rest.starts_with('/') => (scheme, rest.to_string()),
        Some((scheme, rest)) => (scheme, format!("/{rest}")),
        None => ("file", url.to_string()),
    };
    format!("{scheme}{}", SEPARATOR.replace_all(&rest, "."))
}

/// Trailing path segment of a URL, without query string or fragment.
pub fn last_url_segment(url: &str) -> &str {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Relative destination of `url` inside a download directory.
///
/// * an explicit `basename` is used verbatim,
/// * with a `subdir`, the URL's last segment is placed under it,
/// * otherwise the whole URL is flattened with [`safe_filename`].
pub fn local_basename(url: &str, basename: Option<&str>, subdir: Option<&str>) -> PathBuf {
    let name = match (basename, subdir) {
        (Some(basename), _) => basename.to_string(),
        (None, Some(_)) => last_url_segment(url).to_string(),
        (None, None) => safe_filename(url),
    };
    match subdir {
        Some(subdir) => Path::new(subdir).join(name),
        None => PathBuf::from(name),
    }
}

/// `path` relative to `base` if it lies inside it.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(Path::to_path_buf)
}
