//! Building workspaces from descriptors and downloading their files.

use crate::config::Config;
use crate::workspace::Workspace;
use crate::{Error, Result};
use ocrd_fetch::{HttpClient, ReqwestClient};
use ocrd_fs::path::{absolute_from, file_url, is_remote_url, local_basename, strip_file_scheme};
use ocrd_fs::{AtomicWriteOptions, atomic_copy, atomic_read, atomic_write};
use ocrd_models::OcrdMets;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where [`Resolver::download_to_directory`] puts a file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Use this file name verbatim.
    pub basename: Option<String>,
    /// Place the URL's last segment below this directory.
    pub subdir: Option<String>,
    /// Replace an existing destination instead of returning it.
    pub overwrite: bool,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = Some(basename.into());
        self
    }

    pub fn subdir(mut self, subdir: impl Into<String>) -> Self {
        self.subdir = Some(subdir.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Parameters of [`Resolver::workspace_from_url`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FromUrlOptions {
    /// Workspace directory. Without it, a local descriptor is used in place
    /// and a remote one is fetched into a fresh temporary directory.
    pub dst_dir: Option<PathBuf>,
    pub mets_basename: Option<String>,
    /// Overwrite a descriptor already present in `dst_dir`.
    pub clobber_mets: bool,
    /// Copy every file of the descriptor into the workspace.
    pub download_local: bool,
    /// Directory holding the descriptor; also the base of a relative URL.
    pub src_dir: Option<PathBuf>,
}

impl FromUrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dst_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dst_dir = Some(dir.into());
        self
    }

    pub fn mets_basename(mut self, basename: impl Into<String>) -> Self {
        self.mets_basename = Some(basename.into());
        self
    }

    pub fn clobber_mets(mut self, clobber: bool) -> Self {
        self.clobber_mets = clobber;
        self
    }

    pub fn download_local(mut self, download: bool) -> Self {
        self.download_local = download;
        self
    }

    pub fn src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.src_dir = Some(dir.into());
        self
    }
}

/// Factory for [`Workspace`]s and the download primitive they share.
///
/// Relative paths are resolved against a base directory captured once at
/// construction; the process working directory is never changed.
pub struct Resolver<C: HttpClient = ReqwestClient> {
    client: Arc<C>,
    base_dir: PathBuf,
    config: Config,
}

impl<C: HttpClient> Clone for Resolver<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            base_dir: self.base_dir.clone(),
            config: self.config.clone(),
        }
    }
}

impl Resolver<ReqwestClient> {
    /// Resolver with the user configuration and a network client.
    pub fn new() -> Result<Self> {
        Self::from_config(Config::load()?)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let client = ReqwestClient::from_setting(&config.http)?;
        Ok(Self::with_client(client, config))
    }
}

impl<C: HttpClient> Resolver<C> {
    pub fn with_client(client: C, config: Config) -> Self {
        Self {
            client: Arc::new(client),
            base_dir: current_dir_or_temp(),
            config,
        }
    }

    /// Resolve relative paths against `dir` instead of the working directory.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.base_dir = absolute_from(&current_dir_or_temp(), dir);
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Make `url` available as a file below `directory` and return its
    /// absolute path.
    ///
    /// A local file already inside `directory` is returned as is when no
    /// `basename` or `subdir` is requested. An existing destination is kept
    /// unless `overwrite` is set.
    #[instrument(skip(self, directory, options), fields(directory = %directory.as_ref().display()))]
    pub fn download_to_directory(
        &self,
        directory: impl AsRef<Path>,
        url: &str,
        options: DownloadOptions,
    ) -> Result<PathBuf> {
        if url.is_empty() {
            return Err(Error::Argument("'url' must be a string, got an empty value".to_string()));
        }
        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() {
            return Err(Error::Argument(
                "'directory' must be a string, got an empty value".to_string(),
            ));
        }
        let directory = absolute_from(&self.base_dir, directory);

        let local_src = (!is_remote_url(url))
            .then(|| absolute_from(&self.base_dir, strip_file_scheme(url)));

        if let Some(src) = &local_src {
            if options.basename.is_none()
                && options.subdir.is_none()
                && src.starts_with(&directory)
            {
                debug!(path = %src.display(), "already in target directory");
                return Ok(src.clone());
            }
        }

        let source = match &local_src {
            Some(src) => file_url(src),
            None => url.to_string(),
        };
        let name = local_basename(
            &source,
            options.basename.as_deref(),
            options.subdir.as_deref(),
        );
        let dst = directory.join(name);

        if dst.exists() && !options.overwrite {
            debug!(path = %dst.display(), "already present, not downloading again");
            return Ok(dst);
        }

        match local_src {
            Some(src) if src == dst => {}
            Some(src) => {
                if !src.exists() {
                    return Err(Error::NotFound {
                        url: src.display().to_string(),
                    });
                }
                atomic_copy(&src, &dst, AtomicWriteOptions::new().create_parents(true))?;
                debug!(from = %src.display(), to = %dst.display(), "copied");
            }
            None => {
                let bytes = self.client.get(url)?;
                atomic_write(&dst, &bytes, AtomicWriteOptions::new().create_parents(true))?;
                info!(url, path = %dst.display(), bytes = bytes.len(), "downloaded");
            }
        }
        Ok(dst)
    }

    /// Load the descriptor at `mets_url` (or in `src_dir`) into a workspace.
    #[instrument(skip(self, options))]
    pub fn workspace_from_url(
        &self,
        mets_url: Option<&str>,
        options: FromUrlOptions,
    ) -> Result<Workspace<C>> {
        let mets_basename = options
            .mets_basename
            .clone()
            .unwrap_or_else(|| self.config.mets_basename.clone());
        let src_dir = options.src_dir.as_deref().map(|dir| absolute_from(&self.base_dir, dir));

        let mets_url = match (mets_url.filter(|url| !url.is_empty()), &src_dir) {
            (Some(url), Some(src_dir)) if !is_remote_url(url) => {
                absolute_from(src_dir, strip_file_scheme(url)).display().to_string()
            }
            (Some(url), _) => url.to_string(),
            (None, Some(src_dir)) => src_dir.join(&mets_basename).display().to_string(),
            (None, None) => {
                return Err(Error::Argument("Must pass mets_url and/or src_dir".to_string()));
            }
        };

        let local_src = (!is_remote_url(&mets_url))
            .then(|| absolute_from(&self.base_dir, strip_file_scheme(&mets_url)));

        let (dst_dir, fresh) = match (&options.dst_dir, &local_src) {
            (Some(dir), _) => (absolute_from(&self.base_dir, dir), false),
            (None, Some(src)) if !options.download_local => {
                let dir = src
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.base_dir.clone());
                (dir, false)
            }
            (None, _) => (self.fresh_directory()?, true),
        };

        let loaded = self.load_workspace(
            &dst_dir,
            &mets_url,
            local_src.as_deref(),
            mets_basename,
            &options,
        );
        if loaded.is_err() && fresh {
            if let Err(e) = std::fs::remove_dir_all(&dst_dir) {
                warn!(
                    error = %e,
                    directory = %dst_dir.display(),
                    "could not remove temporary directory"
                );
            }
        }
        let workspace = loaded?;
        info!(directory = %workspace.directory().display(), "resolved workspace");
        Ok(workspace)
    }

    fn load_workspace(
        &self,
        dst_dir: &Path,
        mets_url: &str,
        local_src: Option<&Path>,
        mets_basename: String,
        options: &FromUrlOptions,
    ) -> Result<Workspace<C>> {
        std::fs::create_dir_all(dst_dir).map_err(|e| Error::Io {
            path: dst_dir.to_path_buf(),
            source: e,
        })?;

        let dst_mets = dst_dir.join(&mets_basename);
        if local_src != Some(dst_mets.as_path()) {
            if dst_mets.exists() && !options.clobber_mets {
                return Err(Error::Conflict(format!(
                    "File '{}' already exists but clobber_mets is false",
                    dst_mets.display()
                )));
            }
            self.download_to_directory(
                dst_dir,
                mets_url,
                DownloadOptions::new().basename(mets_basename.clone()).overwrite(true),
            )?;
        }

        let mets = OcrdMets::from_xml(&atomic_read(&dst_mets)?)?;
        let baseurl = match local_src {
            Some(src) => src.parent().map(|dir| dir.display().to_string()),
            None => mets_url.rsplit_once('/').map(|(base, _)| base.to_string()),
        };

        let workspace = Workspace::new(self.clone(), dst_dir.to_path_buf(), mets, mets_basename);
        let mut workspace = workspace.with_baseurl(baseurl);
        if options.download_local {
            self.download_all(&mut workspace)?;
        }
        Ok(workspace)
    }

    /// Copy every located file into the workspace and point the descriptor
    /// at the copies.
    fn download_all(&self, workspace: &mut Workspace<C>) -> Result<()> {
        let ids: Vec<String> = workspace
            .mets()
            .files()
            .filter(|file| {
                file.url().is_some_and(|url| !url.is_empty()) || file.local_filename().is_some()
            })
            .filter_map(|file| file.id().map(str::to_string))
            .collect();

        for id in &ids {
            let file = workspace.download_file(id)?;
            if let Some(local) = file.local_filename() {
                let local = local.display().to_string();
                if let Some(entry) = workspace.mets_mut().file_mut(id) {
                    entry.set_url(Some(local));
                }
            }
        }
        workspace.save_mets()?;
        debug!(files = ids.len(), "downloaded all files");
        Ok(())
    }

    /// Create a workspace with an empty descriptor, written to disk at once.
    #[instrument(skip(self))]
    pub fn workspace_from_nothing(
        &self,
        directory: Option<&Path>,
        mets_basename: Option<&str>,
        clobber_mets: bool,
    ) -> Result<Workspace<C>> {
        let mets_basename = mets_basename.unwrap_or(&self.config.mets_basename).to_string();
        let directory = match directory {
            Some(dir) => absolute_from(&self.base_dir, dir),
            None => self.fresh_directory()?,
        };
        std::fs::create_dir_all(&directory).map_err(|e| Error::Io {
            path: directory.clone(),
            source: e,
        })?;

        let mets_path = directory.join(&mets_basename);
        if mets_path.exists() && !clobber_mets {
            return Err(Error::Conflict(format!(
                "Not clobbering existing {} in '{}'",
                mets_basename,
                directory.display()
            )));
        }

        let mets = OcrdMets::empty_mets();
        atomic_write(&mets_path, &mets.to_xml()?, AtomicWriteOptions::new())?;
        info!(directory = %directory.display(), "created empty workspace");
        Ok(Workspace::new(self.clone(), directory, mets, mets_basename))
    }

    /// A new temporary directory that outlives this call.
    fn fresh_directory(&self) -> Result<PathBuf> {
        let dir = tempfile::Builder::new()
            .prefix(&self.config.tmp_prefix)
            .tempdir()
            .map_err(|e| Error::Io {
                path: std::env::temp_dir(),
                source: e,
            })?;
        Ok(dir.keep())
    }
}

fn current_dir_or_temp() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        let fallback = std::env::temp_dir();
        warn!(error = %e, fallback = %fallback.display(), "working directory is gone");
        fallback
    })
}
