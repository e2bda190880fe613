use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::error::{FinderError, Result};

/// An output is stale when it is missing or older than its source.
///
/// Only the source's own timestamp counts; files it imports are not
/// followed, so touching a partial leaves its importers fresh. Map files
/// are not looked at here: the finder treats a missing map as stale on its
/// own, and only for compilers that produce maps.
pub fn is_stale(source_modified: SystemTime, output_modified: Option<SystemTime>) -> bool {
    match output_modified {
        None => true,
        Some(output) => output < source_modified,
    }
}

/// Reads both timestamps from disk and applies [`is_stale`].
pub fn needs_compile(source: &Path, output: &Path) -> Result<bool> {
    let source_modified = modified(source)?.ok_or_else(|| {
        FinderError::fs(source, std::io::Error::from(ErrorKind::NotFound))
    })?;
    Ok(is_stale(source_modified, modified(output)?))
}

fn modified(path: &Path) -> Result<Option<SystemTime>> {
    match path.metadata() {
        Ok(meta) => meta.modified().map(Some).map_err(|e| FinderError::fs(path, e)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FinderError::fs(path, e)),
    }
}
