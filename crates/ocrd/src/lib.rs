//! OCR-D workspaces: a directory plus its METS descriptor.
//!
//! [`Resolver`] creates [`Workspace`]s from a descriptor URL or from
//! nothing, and downloads remote resources. [`Workspace`] adds and removes
//! files, saves the descriptor atomically (optionally with backups) and
//! resolves images.
//!
//! ```no_run
//! use ocrd::{FromUrlOptions, Resolver};
//!
//! let resolver = Resolver::new()?;
//! let url = "https://example.org/data/mets.xml";
//! let workspace = resolver.workspace_from_url(Some(url), FromUrlOptions::new())?;
//! println!("{workspace}");
//! # Ok::<(), ocrd::Error>(())
//! ```

mod backup;
mod error;
mod resolver;
mod workspace;

pub mod config;
pub mod image;

pub use config::Config;
pub use error::{Error, Result};
pub use image::CropBox;
pub use resolver::{DownloadOptions, FromUrlOptions, Resolver};
pub use workspace::Workspace;

pub use ocrd_fetch::{ClientSetting, HttpClient, MockHttpClient, ReqwestClient};
pub use ocrd_models::{FileFilter, Loctype, NewFile, OcrdFile, OcrdMets};
