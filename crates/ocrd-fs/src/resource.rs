//! Search path for processor resources (models, configuration files).
//!
//! Lookup order:
//! 1. the working directory,
//! 2. every entry of `$<EXECUTABLE>_PATH` (colon separated),
//! 3. `$VIRTUAL_ENV/share/<executable>`,
//! 4. the XDG data, config and cache directories, each suffixed with
//!    `<executable>`.
//!
//! Candidates are not checked for existence; the first one that exists wins.

use crate::dirs::{user_cache, user_config, user_data};
use crate::env::Environment;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Name of the environment variable holding extra search paths for
/// `executable`, e.g. `ocrd-tesserocr-recognize` -> `OCRD_TESSEROCR_RECOGNIZE_PATH`.
pub fn path_variable(executable: &str) -> String {
    format!("{}_PATH", executable.replace('-', "_").to_uppercase())
}

fn search_dirs(executable: &str, env: &dyn Environment) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(paths) = env.var(&path_variable(executable)) {
        dirs.extend(paths.split(':').filter(|p| !p.is_empty()).map(PathBuf::from));
    }
    if let Some(venv) = env.var("VIRTUAL_ENV") {
        dirs.push(Path::new(&venv).join("share").join(executable));
    }
    for base in [user_data(env), user_config(env), user_cache(env)].into_iter().flatten() {
        dirs.push(base.join(executable));
    }

    dirs
}

pub fn list_resource_candidates(
    executable: &str,
    fname: &str,
    cwd: &Path,
    env: &dyn Environment,
) -> Vec<PathBuf> {
    std::iter::once(cwd.to_path_buf())
        .chain(search_dirs(executable, env))
        .map(|dir| dir.join(fname))
        .collect()
}

/// Every file below the search directories of `executable`.
///
/// The working directory is skipped, it would produce too many false
/// positives.
pub fn list_all_resources(executable: &str, env: &dyn Environment) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for dir in search_dirs(executable, env) {
        if dir.is_dir() {
            walk_files(&dir, &mut found)?;
        }
    }
    Ok(found)
}

fn walk_files(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::Read {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::Read {
            path: dir.to_path_buf(),
            source: e,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            walk_files(&path, found)?;
        } else {
            found.push(path);
        }
    }
    Ok(())
}
