//! The workspace descriptor: file groups, their files and the physical
//! page mapping, parsed from and serialized to METS XML.

use crate::error::{Error, Result};
use crate::file::OcrdFile;
use crate::filter::FileFilter;
use crate::loctype::Loctype;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const NS_METS: &str = "http://www.loc.gov/METS/";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";

static NEXT_METS_ID: AtomicU64 = AtomicU64::new(1);

static XML_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid regex"));

/// Process-unique identity of an [`OcrdMets`], used as the back-reference
/// from its files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MetsId(u64);

impl MetsId {
    fn next() -> Self {
        Self(NEXT_METS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileGroup {
    pub name: String,
    files: Vec<OcrdFile>,
}

impl FileGroup {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
        }
    }

    pub fn files(&self) -> &[OcrdFile] {
        &self.files
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhysicalPage {
    pub id: String,
    pub file_ids: Vec<String>,
}

/// Fields of a file to register with [`OcrdMets::add_file`].
#[derive(Clone, Debug, Default)]
pub struct NewFile {
    pub id: String,
    pub mimetype: Option<String>,
    pub url: Option<String>,
    pub local_filename: Option<PathBuf>,
    pub page_id: Option<String>,
}

impl NewFile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn local_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_filename = Some(path.into());
        self
    }

    pub fn page_id(mut self, page_id: impl Into<String>) -> Self {
        self.page_id = Some(page_id.into());
        self
    }
}

/// Sections of a parsed document that are carried over verbatim.
#[derive(Clone, Debug, Default)]
struct Verbatim {
    /// Root attributes besides the `mets` and `xlink` namespaces.
    root_attributes: Vec<(String, String)>,
    /// A header with children (agents, alternative IDs).
    header: Option<String>,
    /// `dmdSec` and `amdSec`, written before the file section.
    leading: Vec<String>,
    /// Everything after the file section: logical structure maps,
    /// `structLink`, `behaviorSec`.
    trailing: Vec<String>,
}

/// In-memory METS document.
///
/// Owns its files; every file carries the [`MetsId`] of the document and the
/// name of its group. Mutations never touch the disk.
#[derive(Clone, Debug)]
pub struct OcrdMets {
    id: MetsId,
    created: Option<String>,
    groups: Vec<FileGroup>,
    pages: Vec<PhysicalPage>,
    verbatim: Verbatim,
}

impl OcrdMets {
    fn with_created(created: Option<String>) -> Self {
        Self {
            id: MetsId::next(),
            created,
            groups: Vec::new(),
            pages: Vec::new(),
            verbatim: Verbatim::default(),
        }
    }

    /// A descriptor without groups or files, stamped with the current time.
    pub fn empty_mets() -> Self {
        let now = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        Self::with_created(Some(now))
    }

    pub fn id(&self) -> MetsId {
        self.id
    }

    /// `CREATEDATE` of the METS header.
    pub fn created(&self) -> Option<&str> {
        self.created.as_deref()
    }

    pub fn file_groups(&self) -> Vec<&str> {
        self.groups.iter().map(|grp| grp.name.as_str()).collect()
    }

    fn group(&self, name: &str) -> Option<&FileGroup> {
        self.groups.iter().find(|grp| grp.name == name)
    }

    /// Add an empty group unless it exists.
    pub fn add_file_group(&mut self, name: &str) {
        if self.group(name).is_none() {
            self.groups.push(FileGroup::new(name));
        }
    }

    fn group_index_or_insert(&mut self, name: &str) -> usize {
        match self.groups.iter().position(|grp| grp.name == name) {
            Some(index) => index,
            None => {
                self.groups.push(FileGroup::new(name));
                self.groups.len() - 1
            }
        }
    }

    /// Remove a group. A non-empty group is only removed when `recursive`,
    /// the removed files are returned detached.
    pub fn remove_file_group(&mut self, name: &str, recursive: bool) -> Result<Vec<OcrdFile>> {
        let index = self
            .groups
            .iter()
            .position(|grp| grp.name == name)
            .ok_or_else(|| Error::FileGroupNotFound { name: name.to_string() })?;

        let count = self.groups[index].files.len();
        if count > 0 && !recursive {
            return Err(Error::FileGroupNotEmpty {
                name: name.to_string(),
                count,
            });
        }

        let group = self.groups.remove(index);
        let mut removed = group.files;
        for file in &mut removed {
            if let Some(id) = file.id() {
                self.unlink_pages(id);
            }
            file.detach();
        }
        Ok(removed)
    }

    /// Register a new file in `file_grp`, creating the group if needed.
    ///
    /// IDs are unique across the whole document.
    pub fn add_file(&mut self, file_grp: &str, new: NewFile) -> Result<&OcrdFile> {
        if !XML_ID.is_match(&new.id) {
            return Err(Error::InvalidId { id: new.id });
        }
        if self.file(&new.id).is_some() {
            return Err(Error::DuplicateId { id: new.id });
        }

        let mut file = OcrdFile::new().with_id(new.id.clone());
        if let Some(local_filename) = new.local_filename {
            file = file.with_local_filename(local_filename);
        }
        if let Some(url) = new.url {
            file = file.with_url(url);
        }
        if let Some(mimetype) = new.mimetype {
            file = file.with_mimetype(mimetype);
        }
        if let Some(page_id) = new.page_id.as_deref() {
            self.link_page(&new.id, page_id);
        }

        Ok(self.push_file(file_grp, file))
    }

    fn push_file(&mut self, file_grp: &str, mut file: OcrdFile) -> &OcrdFile {
        file.attach(self.id, file_grp);
        let index = self.group_index_or_insert(file_grp);
        let files = &mut self.groups[index].files;
        files.push(file);
        &files[files.len() - 1]
    }

    /// Files matching `filter`, in group order and insertion order within a
    /// group.
    pub fn find_files(&self, filter: &FileFilter) -> Result<Vec<&OcrdFile>> {
        let filter = filter.compile()?;
        let found = self
            .groups
            .iter()
            .filter(|grp| filter.file_grp.matches(Some(grp.name.as_str())))
            .flat_map(|grp| grp.files.iter())
            .filter(|file| filter.id.matches(file.id()))
            .filter(|file| filter.mimetype.matches_mimetype(file.mimetype()))
            .filter(|file| filter.url.matches(file.url()))
            .filter(|file| filter.page_id.matches(file.id().and_then(|id| self.page_id_of(id))))
            .collect();
        Ok(found)
    }

    /// All files, in group order.
    pub fn files(&self) -> impl Iterator<Item = &OcrdFile> {
        self.groups.iter().flat_map(|grp| grp.files.iter())
    }

    pub fn file(&self, id: &str) -> Option<&OcrdFile> {
        self.files().find(|file| file.id() == Some(id))
    }

    pub fn file_mut(&mut self, id: &str) -> Option<&mut OcrdFile> {
        self.groups
            .iter_mut()
            .flat_map(|grp| grp.files.iter_mut())
            .find(|file| file.id() == Some(id))
    }

    /// Remove a file and its page links, returning it detached.
    pub fn remove_file(&mut self, id: &str) -> Result<OcrdFile> {
        let (grp, index) = self
            .groups
            .iter()
            .enumerate()
            .find_map(|(grp, group)| {
                let index = group.files.iter().position(|file| file.id() == Some(id))?;
                Some((grp, index))
            })
            .ok_or_else(|| Error::FileNotFound { id: id.to_string() })?;

        let mut file = self.groups[grp].files.remove(index);
        file.detach();
        self.unlink_pages(id);
        Ok(file)
    }

    /// Physical page holding file `file_id`.
    pub fn page_id_of(&self, file_id: &str) -> Option<&str> {
        self.pages
            .iter()
            .find(|page| page.file_ids.iter().any(|fid| fid == file_id))
            .map(|page| page.id.as_str())
    }

    /// Move file `file_id` to `page_id`, or off every page with `None`.
    pub fn set_page_id(&mut self, file_id: &str, page_id: Option<&str>) -> Result<()> {
        if self.file(file_id).is_none() {
            return Err(Error::FileNotFound {
                id: file_id.to_string(),
            });
        }
        self.unlink_pages(file_id);
        if let Some(page_id) = page_id {
            self.link_page(file_id, page_id);
        }
        Ok(())
    }

    pub fn physical_pages(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.id.as_str()).collect()
    }

    fn link_page(&mut self, file_id: &str, page_id: &str) {
        let index = match self.pages.iter().position(|page| page.id == page_id) {
            Some(index) => index,
            None => {
                self.pages.push(PhysicalPage {
                    id: page_id.to_string(),
                    file_ids: Vec::new(),
                });
                self.pages.len() - 1
            }
        };
        self.pages[index].file_ids.push(file_id.to_string());
    }

    fn unlink_pages(&mut self, file_id: &str) {
        for page in &mut self.pages {
            page.file_ids.retain(|fid| fid != file_id);
        }
    }

    /// Parse a METS document.
    ///
    /// The header date, the file section and the physical structure map are
    /// read into the model. Other top-level sections are kept as written and
    /// serialized again by [`to_xml`](Self::to_xml).
    pub fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        let mut mets = Self::with_created(None);
        let mut seen_root = false;
        let mut depth = 0usize;

        let mut current_grp: Option<String> = None;
        let mut current_file: Option<OcrdFile> = None;
        let mut locations = 0usize;
        let mut in_physical = false;
        let mut current_page: Option<PhysicalPage> = None;

        loop {
            let offset = reader.buffer_position() as usize;
            let event = reader.read_event()?;
            let (element, is_empty) = match &event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    match e.local_name().as_ref() {
                        b"fileGrp" => current_grp = None,
                        b"file" => {
                            if let (Some(grp), Some(file)) =
                                (current_grp.as_deref(), current_file.take())
                            {
                                mets.push_file(grp, file);
                            }
                        }
                        b"structMap" => in_physical = false,
                        b"div" => {
                            if let Some(page) = current_page.take() {
                                mets.pages.push(page);
                            }
                        }
                        _ => {}
                    }
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            if depth == 1 {
                let local_name = element.local_name();
                let verbatim = match local_name.as_ref() {
                    b"metsHdr" => {
                        mets.created = attribute(element, b"CREATEDATE")?;
                        !is_empty
                    }
                    b"fileSec" => false,
                    b"structMap" => attribute(element, b"TYPE")?.as_deref() != Some("PHYSICAL"),
                    _ => true,
                };
                if verbatim {
                    if !is_empty {
                        reader.read_to_end(element.name())?;
                    }
                    let end = reader.buffer_position() as usize;
                    let section = String::from_utf8_lossy(&xml[offset..end]).into_owned();
                    match local_name.as_ref() {
                        b"metsHdr" => mets.verbatim.header = Some(section),
                        b"dmdSec" | b"amdSec" => mets.verbatim.leading.push(section),
                        _ => mets.verbatim.trailing.push(section),
                    }
                    continue;
                }
            }
            if !is_empty {
                depth += 1;
            }

            match element.local_name().as_ref() {
                b"mets" if !seen_root => {
                    seen_root = true;
                    mets.verbatim.root_attributes = root_attributes(element)?;
                }
                b"metsHdr" => mets.created = attribute(element, b"CREATEDATE")?,
                b"fileGrp" => {
                    let name = attribute(element, b"USE")?
                        .ok_or_else(|| Error::InvalidMets("fileGrp without USE".to_string()))?;
                    mets.add_file_group(&name);
                    if !is_empty {
                        current_grp = Some(name);
                    }
                }
                b"file" => {
                    let Some(grp) = current_grp.as_deref() else {
                        return Err(Error::InvalidMets("file outside of a fileGrp".to_string()));
                    };
                    let mut file = OcrdFile::new();
                    file.set_id(attribute(element, b"ID")?);
                    file.set_mimetype(attribute(element, b"MIMETYPE")?);
                    locations = 0;
                    if is_empty {
                        mets.push_file(grp, file);
                    } else {
                        current_file = Some(file);
                    }
                }
                b"FLocat" => {
                    if let Some(file) = current_file.as_mut() {
                        read_location(element, file, locations)?;
                        locations += 1;
                    }
                }
                b"structMap" => {
                    in_physical = attribute(element, b"TYPE")?.as_deref() == Some("PHYSICAL");
                }
                b"div" if in_physical => {
                    if attribute(element, b"TYPE")?.as_deref() == Some("page") {
                        let id = attribute(element, b"ID")?
                            .ok_or_else(|| Error::InvalidMets("page div without ID".to_string()))?;
                        let page = PhysicalPage {
                            id,
                            file_ids: Vec::new(),
                        };
                        if is_empty {
                            mets.pages.push(page);
                        } else {
                            current_page = Some(page);
                        }
                    }
                }
                b"fptr" => {
                    if let (Some(page), Some(file_id)) =
                        (current_page.as_mut(), attribute(element, b"FILEID")?)
                    {
                        page.file_ids.push(file_id);
                    }
                }
                _ => {}
            }
        }

        if !seen_root {
            return Err(Error::InvalidMets("no mets root element".to_string()));
        }
        debug!(
            groups = mets.groups.len(),
            files = mets.files().count(),
            pages = mets.pages.len(),
            "parsed descriptor"
        );
        Ok(mets)
    }

    /// Serialize to METS XML.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut root = BytesStart::new("mets:mets")
            .with_attributes([("xmlns:mets", NS_METS), ("xmlns:xlink", NS_XLINK)]);
        for (key, value) in &self.verbatim.root_attributes {
            root.push_attribute((key.as_str(), value.as_str()));
        }
        emit(&mut writer, Event::Start(root))?;

        match &self.verbatim.header {
            Some(header) => write_verbatim(&mut writer, header),
            None => {
                let mut header = BytesStart::new("mets:metsHdr");
                if let Some(created) = &self.created {
                    header.push_attribute(("CREATEDATE", created.as_str()));
                }
                emit(&mut writer, Event::Empty(header))?;
            }
        }
        for section in &self.verbatim.leading {
            write_verbatim(&mut writer, section);
        }

        if self.groups.is_empty() {
            emit(&mut writer, Event::Empty(BytesStart::new("mets:fileSec")))?;
        } else {
            emit(&mut writer, Event::Start(BytesStart::new("mets:fileSec")))?;
            for grp in &self.groups {
                write_group(&mut writer, grp)?;
            }
            emit(&mut writer, Event::End(BytesEnd::new("mets:fileSec")))?;
        }

        if !self.pages.is_empty() {
            let struct_map =
                BytesStart::new("mets:structMap").with_attributes([("TYPE", "PHYSICAL")]);
            emit(&mut writer, Event::Start(struct_map))?;
            let sequence = BytesStart::new("mets:div").with_attributes([("TYPE", "physSequence")]);
            emit(&mut writer, Event::Start(sequence))?;
            for page in &self.pages {
                let div = BytesStart::new("mets:div")
                    .with_attributes([("TYPE", "page"), ("ID", page.id.as_str())]);
                if page.file_ids.is_empty() {
                    emit(&mut writer, Event::Empty(div))?;
                    continue;
                }
                emit(&mut writer, Event::Start(div))?;
                for file_id in &page.file_ids {
                    let fptr = BytesStart::new("mets:fptr")
                        .with_attributes([("FILEID", file_id.as_str())]);
                    emit(&mut writer, Event::Empty(fptr))?;
                }
                emit(&mut writer, Event::End(BytesEnd::new("mets:div")))?;
            }
            emit(&mut writer, Event::End(BytesEnd::new("mets:div")))?;
            emit(&mut writer, Event::End(BytesEnd::new("mets:structMap")))?;
        }
        for section in &self.verbatim.trailing {
            write_verbatim(&mut writer, section);
        }

        emit(&mut writer, Event::End(BytesEnd::new("mets:mets")))?;

        let mut xml = writer.into_inner();
        xml.push(b'\n');
        Ok(xml)
    }
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn root_attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut kept = Vec::new();
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if key == "xmlns:mets" || key == "xmlns:xlink" {
            continue;
        }
        let value = attr.unescape_value().map_err(quick_xml::Error::from)?;
        kept.push((key, value.into_owned()));
    }
    Ok(kept)
}

/// The first location is the file's URL; a later `OTHER`/`FILE` location
/// carries a separate local filename.
fn read_location(element: &BytesStart<'_>, file: &mut OcrdFile, position: usize) -> Result<()> {
    let loctype = attribute(element, b"LOCTYPE")?
        .map(|value| value.parse::<Loctype>())
        .transpose()
        .map_err(|e| Error::InvalidMets(e.to_string()))?
        .unwrap_or_default();
    let otherloctype = attribute(element, b"OTHERLOCTYPE")?;
    let href = attribute(element, b"href")?;

    if position == 0 {
        file.set_loctype(loctype);
        if loctype == Loctype::Other {
            file.set_otherloctype(otherloctype);
        }
        if let Some(href) = href {
            *file = std::mem::take(file).with_url(href);
        }
    } else if loctype == Loctype::Other && otherloctype.as_deref() == Some("FILE") {
        file.set_local_filename(href.map(PathBuf::from));
    }
    Ok(())
}

fn write_group(writer: &mut Writer<Vec<u8>>, grp: &FileGroup) -> Result<()> {
    let start = BytesStart::new("mets:fileGrp").with_attributes([("USE", grp.name.as_str())]);
    if grp.files.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for file in &grp.files {
        write_file(writer, file)?;
    }
    emit(writer, Event::End(BytesEnd::new("mets:fileGrp")))
}

fn write_file(writer: &mut Writer<Vec<u8>>, file: &OcrdFile) -> Result<()> {
    let mut start = BytesStart::new("mets:file");
    if let Some(id) = file.id() {
        start.push_attribute(("ID", id));
    }
    if let Some(mimetype) = file.mimetype() {
        start.push_attribute(("MIMETYPE", mimetype));
    }
    emit(writer, Event::Start(start))?;

    let local = file.local_filename().map(|path| path.to_string_lossy().into_owned());
    let href = file.url().map(str::to_string).or_else(|| local.clone());

    let mut location = BytesStart::new("mets:FLocat");
    location.push_attribute(("LOCTYPE", file.loctype().as_str()));
    if let Some(otherloctype) = file.otherloctype() {
        location.push_attribute(("OTHERLOCTYPE", otherloctype));
    }
    if let Some(href) = &href {
        location.push_attribute(("xlink:href", href.as_str()));
    }
    emit(writer, Event::Empty(location))?;

    // Keep a local copy of a file whose URL points elsewhere.
    let derived = file
        .url()
        .filter(|url| !url.is_empty() && !ocrd_fs::path::is_remote_url(url))
        .map(|url| ocrd_fs::path::strip_file_scheme(url).to_string());
    if let Some(local) =
        local.filter(|local| Some(local) != href.as_ref() && Some(local) != derived.as_ref())
    {
        let location = BytesStart::new("mets:FLocat").with_attributes([
            ("LOCTYPE", "OTHER"),
            ("OTHERLOCTYPE", "FILE"),
            ("xlink:href", local.as_str()),
        ]);
        emit(writer, Event::Empty(location))?;
    }

    emit(writer, Event::End(BytesEnd::new("mets:file")))
}

/// Append an unparsed section as a child of the root element.
fn write_verbatim(writer: &mut Writer<Vec<u8>>, section: &str) {
    let out = writer.get_mut();
    out.extend_from_slice(b"\n  ");
    out.extend_from_slice(section.as_bytes());
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(|e| Error::Serialize(e.to_string()))
}
