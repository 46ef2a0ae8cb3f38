//! Filesystem primitives for OCR-D workspaces.
//!
//! - [`primitives`] - crash-safe writes and copies
//! - [`permissions`] - mode bits for replacement files
//! - [`path`] - descriptor locations to local paths
//! - [`resource`] - processor resource search path
//! - [`extract`] - archive extraction

mod error;

pub mod dirs;
pub mod env;
pub mod extract;
pub mod path;
pub mod permissions;
pub mod primitives;
pub mod resource;

pub use error::{Error, Result};
pub use extract::unzip_file_to_dir;
pub use permissions::PermissionMode;
pub use primitives::{
    Options as AtomicWriteOptions, atomic_copy, atomic_read, atomic_write, atomic_write_from,
};
pub use resource::{list_all_resources, list_resource_candidates};
