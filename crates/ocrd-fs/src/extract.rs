use crate::path::normalize;
use crate::primitives::{Options, atomic_write_from};
use crate::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Extract a ZIP archive into `output_dir`, returning the extracted files.
///
/// Entries whose path would land outside `output_dir` abort the extraction.
#[instrument(
    skip_all,
    fields(zip = %zip_path.as_ref().display(), dest = %output_dir.as_ref().display())
)]
pub fn unzip_file_to_dir(
    zip_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let zip_path = zip_path.as_ref();
    let base = normalize(output_dir.as_ref());

    let file = File::open(zip_path).map_err(|e| Error::Read {
        path: zip_path.to_path_buf(),
        source: e,
    })?;
    let mut archive = zip::ZipArchive::new(file)?;

    std::fs::create_dir_all(&base).map_err(|e| Error::CreateDir {
        path: base.clone(),
        source: e,
    })?;

    let mut extracted = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = PathBuf::from(entry.name());
        let relative = entry.enclosed_name().ok_or_else(|| Error::ZipSlip {
            entry: name.clone(),
            resolved: base.join(&name),
        })?;

        let resolved = normalize(&base.join(relative));
        if !resolved.starts_with(&base) {
            return Err(Error::ZipSlip { entry: name, resolved });
        }

        if entry.is_dir() {
            std::fs::create_dir_all(&resolved).map_err(|e| Error::CreateDir {
                path: resolved.clone(),
                source: e,
            })?;
            continue;
        }

        atomic_write_from(&resolved, &mut entry, Options::new().create_parents(true).sync(false))?;
        extracted.push(resolved);
    }

    debug!(files = extracted.len(), "extracted archive");
    Ok(extracted)
}
