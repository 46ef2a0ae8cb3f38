//! One entry of a workspace descriptor.

use crate::error::{Error, Result};
use crate::loctype::Loctype;
use crate::mets::{MetsId, OcrdMets};
use crate::mimetype;
use ocrd_fs::path::{is_remote_url, last_url_segment, strip_file_scheme};
use std::path::{Path, PathBuf};

/// Group name reported for entries that no descriptor owns.
pub const TEMP_FILE_GRP: &str = "TEMP";

const DEFAULT_OTHERLOCTYPE: &str = "FILE";

/// Non-owning link from an entry to the descriptor holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Owner {
    pub mets: MetsId,
    pub file_grp: String,
}

/// A file record: identity, location and group membership.
///
/// Equality compares the ID and the normalized MIME type only, so an
/// `image/tif` entry equals an `image/tiff` entry with the same ID.
#[derive(Clone, Debug)]
pub struct OcrdFile {
    id: Option<String>,
    mimetype: Option<String>,
    url: Option<String>,
    local_filename: Option<PathBuf>,
    loctype: Loctype,
    otherloctype: Option<String>,
    owner: Option<Owner>,
}

impl Default for OcrdFile {
    fn default() -> Self {
        Self {
            id: None,
            mimetype: None,
            url: None,
            local_filename: None,
            loctype: Loctype::Other,
            otherloctype: Some(DEFAULT_OTHERLOCTYPE.to_string()),
            owner: None,
        }
    }
}

impl OcrdFile {
    /// An unowned entry with no ID and no location.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.set_id(Some(id.into()));
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    /// Set the location. A non-empty local URL also becomes the local
    /// filename unless one is already set.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if self.local_filename.is_none() && !url.is_empty() && !is_remote_url(&url) {
            self.local_filename = Some(PathBuf::from(strip_file_scheme(&url)));
        }
        self.url = Some(url);
        self
    }

    pub fn with_local_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_filename = Some(path.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Assign the ID. `None` or an empty string leaves the current ID in place.
    pub fn set_id(&mut self, id: Option<String>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.id = Some(id);
        }
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.mimetype.as_deref()
    }

    pub fn set_mimetype(&mut self, mimetype: Option<String>) {
        self.mimetype = mimetype;
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn set_url(&mut self, url: Option<String>) {
        self.url = url;
    }

    pub fn local_filename(&self) -> Option<&Path> {
        self.local_filename.as_deref()
    }

    pub fn set_local_filename(&mut self, path: Option<PathBuf>) {
        self.local_filename = path;
    }

    pub fn loctype(&self) -> Loctype {
        self.loctype
    }

    /// Set the location type. Anything but [`Loctype::Other`] clears
    /// `otherloctype`; switching back does not restore it.
    pub fn set_loctype(&mut self, loctype: Loctype) {
        self.loctype = loctype;
        if loctype != Loctype::Other {
            self.otherloctype = None;
        }
    }

    pub fn otherloctype(&self) -> Option<&str> {
        self.otherloctype.as_deref()
    }

    /// Set the custom location type, forcing `loctype` back to `OTHER`.
    pub fn set_otherloctype(&mut self, otherloctype: Option<String>) {
        if otherloctype.is_some() {
            self.loctype = Loctype::Other;
        }
        self.otherloctype = otherloctype;
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub(crate) fn attach(&mut self, mets: MetsId, file_grp: &str) {
        self.owner = Some(Owner {
            mets,
            file_grp: file_grp.to_string(),
        });
    }

    pub(crate) fn detach(&mut self) {
        self.owner = None;
    }

    /// Name of the owning group, [`TEMP_FILE_GRP`] when unowned.
    pub fn file_grp(&self) -> &str {
        self.owner.as_ref().map_or(TEMP_FILE_GRP, |owner| owner.file_grp.as_str())
    }

    fn ownership_error(&self) -> Error {
        Error::Ownership {
            file: self.id.clone().unwrap_or_else(|| "<no ID>".to_string()),
        }
    }

    fn check_owner(&self, mets: &OcrdMets) -> Result<()> {
        match &self.owner {
            Some(owner) if owner.mets == mets.id() => Ok(()),
            _ => Err(self.ownership_error()),
        }
    }

    /// Physical page this entry belongs to, looked up in the owning descriptor.
    pub fn page_id<'m>(&self, mets: &'m OcrdMets) -> Result<Option<&'m str>> {
        self.check_owner(mets)?;
        let id = self.id.as_deref().ok_or_else(|| self.ownership_error())?;
        Ok(mets.page_id_of(id))
    }

    /// Assign this entry to a physical page of the owning descriptor.
    ///
    /// The entry must not be borrowed from `mets`; clone it first, or call
    /// [`OcrdMets::set_page_id`] with the ID.
    pub fn set_page_id(&self, mets: &mut OcrdMets, page_id: Option<&str>) -> Result<()> {
        self.check_owner(mets)?;
        let id = self.id.as_deref().ok_or_else(|| self.ownership_error())?;
        mets.set_page_id(id, page_id)
    }

    /// File name of `local_filename`, else the last segment of `url`.
    pub fn basename(&self) -> String {
        if let Some(name) = self.local_filename.as_deref().and_then(Path::file_name) {
            return name.to_string_lossy().into_owned();
        }
        self.url.as_deref().map(last_url_segment).unwrap_or_default().to_string()
    }

    /// Suffix of [`basename`](Self::basename), `.tar.<x>` counting as one.
    pub fn extension(&self) -> String {
        split_extension(&self.basename()).1.to_string()
    }

    pub fn basename_without_extension(&self) -> String {
        split_extension(&self.basename()).0.to_string()
    }
}

fn split_extension(basename: &str) -> (&str, &str) {
    let Some(dot) = basename.rfind('.').filter(|&dot| dot > 0) else {
        return (basename, "");
    };
    let (stem, _) = basename.split_at(dot);
    if let Some(tar) = stem.strip_suffix(".tar").filter(|s| !s.is_empty()) {
        return basename.split_at(tar.len());
    }
    basename.split_at(dot)
}

impl PartialEq for OcrdFile {
    fn eq(&self, other: &Self) -> bool {
        let same_mimetype = match (self.mimetype.as_deref(), other.mimetype.as_deref()) {
            (Some(a), Some(b)) => mimetype::equivalent(a, b),
            (None, None) => true,
            _ => false,
        };
        self.id == other.id && same_mimetype
    }
}

impl Eq for OcrdFile {}
