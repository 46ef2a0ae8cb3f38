//! Data model of an OCR-D workspace descriptor.
//!
//! [`OcrdMets`] owns groups of [`OcrdFile`] entries and the physical page
//! mapping, and converts to and from METS XML. Files refer back to their
//! descriptor by [`MetsId`] only.

mod error;
mod file;
mod filter;
mod loctype;
mod mets;

pub mod mimetype;

pub use error::{Error, Result};
pub use file::{OcrdFile, Owner, TEMP_FILE_GRP};
pub use filter::{FileFilter, REGEX_PREFIX};
pub use loctype::{Loctype, LoctypeError};
pub use mets::{FileGroup, MetsId, NS_METS, NS_XLINK, NewFile, OcrdMets, PhysicalPage};
