//! Loader – reads the markdown source from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::LoadError;

/// Read `path` as UTF-8 text.
///
/// A missing file maps to [`LoadError::NotFound`], undecodable bytes to
/// [`LoadError::Decode`]; anything else is reported as [`LoadError::Io`].
pub fn read(path: &Path) -> Result<String, LoadError> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("Loaded '{}' ({} bytes)", path.display(), text.len());
    Ok(text)
}
