use super::atomic_write::{Options, atomic_write_from};
use crate::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Copy `from` onto `to` through an atomic write.
pub fn atomic_copy(from: impl AsRef<Path>, to: impl AsRef<Path>, options: Options) -> Result<u64> {
    let from = from.as_ref();
    let to = to.as_ref();

    let source = File::open(from).map_err(|e| Error::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source: e,
    })?;
    atomic_write_from(to, source, options)
}
