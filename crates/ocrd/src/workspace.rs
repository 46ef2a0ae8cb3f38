//! A directory plus its loaded descriptor.

use crate::backup;
use crate::image::{self, CropBox};
use crate::resolver::{DownloadOptions, Resolver};
use crate::{Error, Result};
use ::image::DynamicImage;
use ocrd_fetch::{HttpClient, ReqwestClient};
use ocrd_fs::path::{absolute_from, file_url, is_remote_url, relative_to, strip_file_scheme};
use ocrd_fs::{AtomicWriteOptions, atomic_read, atomic_write};
use ocrd_models::{NewFile, OcrdFile, OcrdMets};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Owns a descriptor and the directory its local files live in.
///
/// Nothing is written to disk until [`save_mets`](Self::save_mets), except
/// file content handed to [`add_file`](Self::add_file) and downloads.
pub struct Workspace<C: HttpClient = ReqwestClient> {
    directory: PathBuf,
    mets_basename: String,
    mets: OcrdMets,
    /// Copy the previous descriptor aside before every save.
    pub automatic_backup: bool,
    resolver: Resolver<C>,
    baseurl: Option<String>,
}

impl<C: HttpClient> Workspace<C> {
    pub fn new(
        resolver: Resolver<C>,
        directory: PathBuf,
        mets: OcrdMets,
        mets_basename: String,
    ) -> Self {
        Self {
            automatic_backup: resolver.config().automatic_backup,
            directory,
            mets_basename,
            mets,
            resolver,
            baseurl: None,
        }
    }

    /// Location the descriptor was loaded from; relative hrefs that are not
    /// present in the workspace are fetched relative to it.
    pub fn with_baseurl(mut self, baseurl: Option<String>) -> Self {
        self.baseurl = baseurl;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn mets(&self) -> &OcrdMets {
        &self.mets
    }

    pub fn mets_mut(&mut self) -> &mut OcrdMets {
        &mut self.mets
    }

    pub fn mets_basename(&self) -> &str {
        &self.mets_basename
    }

    pub fn mets_path(&self) -> PathBuf {
        self.directory.join(&self.mets_basename)
    }

    pub fn baseurl(&self) -> Option<&str> {
        self.baseurl.as_deref()
    }

    pub fn resolver(&self) -> &Resolver<C> {
        &self.resolver
    }

    fn backup_root(&self) -> PathBuf {
        self.directory.join(&self.resolver.config().backup_dir)
    }

    /// Register a file in `file_grp`, writing `content` to its local file.
    ///
    /// Without an explicit URL the entry points at its local file
    /// (`file://<absolute path>`), or gets an empty URL if there is none.
    pub fn add_file(
        &mut self,
        file_grp: &str,
        mut new: NewFile,
        content: Option<&[u8]>,
    ) -> Result<&OcrdFile> {
        let target = new
            .local_filename
            .as_deref()
            .map(|local| absolute_from(&self.directory, local));

        if content.is_some() && target.is_none() {
            return Err(Error::Argument("'content' was set but no 'local_filename'".to_string()));
        }
        if new.url.is_none() {
            new.url = Some(target.as_deref().map(file_url).unwrap_or_default());
        }

        let id = new.id.clone();
        let new_group = !self.mets.file_groups().contains(&file_grp);
        self.mets.add_file(file_grp, new)?;

        if let (Some(content), Some(target)) = (content, &target) {
            let written =
                atomic_write(target, content, AtomicWriteOptions::new().create_parents(true));
            if let Err(e) = written {
                self.mets.remove_file(&id)?;
                if new_group {
                    self.mets.remove_file_group(file_grp, false)?;
                }
                return Err(e.into());
            }
            debug!(path = %target.display(), bytes = content.len(), "wrote file content");
        }

        self.mets
            .file(&id)
            .ok_or_else(|| ocrd_models::Error::FileNotFound { id }.into())
    }

    /// Write the descriptor, backing up the previous one first if
    /// `automatic_backup` is set.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub fn save_mets(&self) -> Result<()> {
        let path = self.mets_path();
        if self.automatic_backup {
            backup::create(&self.backup_root(), &path)?;
        }
        atomic_write(&path, &self.mets.to_xml()?, AtomicWriteOptions::new())?;
        info!(path = %path.display(), "saved descriptor");
        Ok(())
    }

    /// Replace the in-memory descriptor with the one on disk.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub fn reload_mets(&mut self) -> Result<()> {
        let path = self.mets_path();
        self.mets = OcrdMets::from_xml(&atomic_read(&path)?)?;
        debug!(path = %path.display(), "reloaded descriptor");
        Ok(())
    }

    /// Descriptor backups, oldest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>> {
        backup::list(&self.backup_root(), &self.mets_basename)
    }

    /// Restore the newest backup and reload it.
    pub fn undo(&mut self) -> Result<()> {
        backup::restore_latest(&self.backup_root(), &self.mets_path(), &self.mets_basename)?;
        self.reload_mets()
    }

    /// Where to fetch a file's href from: relative paths are looked up in
    /// the workspace first, then below the descriptor's base location.
    fn source_of(&self, href: &str) -> String {
        if is_remote_url(href) {
            return href.to_string();
        }
        let path = Path::new(strip_file_scheme(href));
        if path.is_absolute() {
            return path.display().to_string();
        }

        let in_workspace = self.directory.join(path);
        match self.baseurl.as_deref() {
            Some(base) if !in_workspace.exists() => {
                if is_remote_url(base) {
                    format!("{}/{}", base.trim_end_matches('/'), href)
                } else {
                    absolute_from(Path::new(strip_file_scheme(base)), path).display().to_string()
                }
            }
            _ => in_workspace.display().to_string(),
        }
    }

    /// Make the file `id` available below `<directory>/<fileGrp>/` unless its
    /// local file already exists inside the workspace, and record the local
    /// path.
    #[instrument(skip(self), fields(directory = %self.directory.display()))]
    pub fn download_file(&mut self, id: &str) -> Result<OcrdFile> {
        let file = self
            .mets
            .file(id)
            .ok_or_else(|| ocrd_models::Error::FileNotFound { id: id.to_string() })?;

        if let Some(local) = file.local_filename() {
            let path = absolute_from(&self.directory, local);
            if path.exists() && relative_to(&path, &self.directory).is_some() {
                debug!(id, "already local");
                return Ok(file.clone());
            }
        }

        let href = match (file.url().filter(|url| !url.is_empty()), file.local_filename()) {
            (Some(url), _) => url.to_string(),
            (None, Some(local)) => local.display().to_string(),
            (None, None) => {
                return Err(Error::Argument(format!(
                    "file '{id}' has neither a url nor a local_filename"
                )));
            }
        };
        let file_grp = file.file_grp().to_string();

        let source = self.source_of(&href);
        let path = self.resolver.download_to_directory(
            &self.directory,
            &source,
            DownloadOptions::new().subdir(file_grp),
        )?;
        let local = relative_to(&path, &self.directory).unwrap_or(path);

        let file = self
            .mets
            .file_mut(id)
            .ok_or_else(|| ocrd_models::Error::FileNotFound { id: id.to_string() })?;
        file.set_local_filename(Some(local));
        Ok(file.clone())
    }

    /// Download `url` into the workspace without registering it.
    pub fn download_url(&self, url: &str, basename: Option<&str>) -> Result<OcrdFile> {
        let mut options = DownloadOptions::new();
        if let Some(basename) = basename {
            options = options.basename(basename);
        }
        let path = self.resolver.download_to_directory(&self.directory, url, options)?;
        let mut file = OcrdFile::new().with_url(url);
        file.set_local_filename(Some(path));
        Ok(file)
    }

    /// Unregister a file and delete its local copy unless `keep_file`.
    pub fn remove_file(&mut self, id: &str, keep_file: bool) -> Result<OcrdFile> {
        let file = self.mets.remove_file(id)?;
        if !keep_file {
            self.delete_local(&file)?;
        }
        Ok(file)
    }

    /// Unregister a file group. Its directory is deleted once it is empty.
    pub fn remove_file_group(
        &mut self,
        name: &str,
        recursive: bool,
        keep_files: bool,
    ) -> Result<()> {
        let files = self.mets.remove_file_group(name, recursive)?;
        if keep_files {
            return Ok(());
        }
        for file in &files {
            self.delete_local(file)?;
        }

        let dir = self.directory.join(name);
        let is_empty = std::fs::read_dir(&dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(false);
        if is_empty {
            std::fs::remove_dir(&dir).map_err(|e| Error::Io { path: dir, source: e })?;
        }
        Ok(())
    }

    fn delete_local(&self, file: &OcrdFile) -> Result<()> {
        let Some(local) = file.local_filename() else {
            return Ok(());
        };
        let path = absolute_from(&self.directory, local);
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| Error::Io { path: path.clone(), source: e })?;
            debug!(path = %path.display(), "deleted local file");
        }
        Ok(())
    }

    /// Decode the image behind a file URL or path, optionally cropped.
    ///
    /// A URL registered in the descriptor is materialized like
    /// [`download_file`](Self::download_file); other remote URLs are
    /// downloaded into the workspace once and reused afterwards.
    #[instrument(skip(self, crop), fields(directory = %self.directory.display()))]
    pub fn resolve_image(
        &mut self,
        url_or_path: &str,
        crop: Option<CropBox>,
    ) -> Result<DynamicImage> {
        let registered = self
            .mets
            .files()
            .find(|file| file.url() == Some(url_or_path))
            .and_then(|file| file.id().map(str::to_string));

        let path = match registered {
            Some(id) => {
                let file = self.download_file(&id)?;
                let local = file.local_filename().ok_or_else(|| Error::NotFound {
                    url: url_or_path.to_string(),
                })?;
                absolute_from(&self.directory, local)
            }
            None if !is_remote_url(url_or_path) => {
                let path = absolute_from(&self.directory, strip_file_scheme(url_or_path));
                if !path.is_file() {
                    return Err(Error::NotFound {
                        url: url_or_path.to_string(),
                    });
                }
                path
            }
            None => self
                .resolver
                .download_to_directory(&self.directory, url_or_path, DownloadOptions::new())?,
        };

        let decoded = image::open(&path)?;
        debug!(
            path = %path.display(),
            width = decoded.width(),
            height = decoded.height(),
            "decoded image"
        );
        match crop {
            Some(area) => image::crop(&decoded, area),
            None => Ok(decoded),
        }
    }
}

fn quoted_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let quoted: Vec<String> = items.into_iter().map(|item| format!("'{item}'")).collect();
    format!("[{}]", quoted.join(", "))
}

impl<C: HttpClient> fmt::Display for Workspace<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut groups = self.mets.file_groups();
        groups.sort_unstable();
        let mut files: Vec<&str> = self.mets.files().filter_map(OcrdFile::id).collect();
        files.sort_unstable();
        write!(
            f,
            "Workspace[directory={}, file_groups={}, files={}]",
            self.directory.display(),
            quoted_list(groups),
            quoted_list(files)
        )
    }
}

impl<C: HttpClient> fmt::Debug for Workspace<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("directory", &self.directory)
            .field("mets_basename", &self.mets_basename)
            .field("automatic_backup", &self.automatic_backup)
            .field("baseurl", &self.baseurl)
            .finish_non_exhaustive()
    }
}
