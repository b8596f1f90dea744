//! Writes generated files to disk.
//!
//! Files are replaced wholesale. A failure stops the pass at the offending
//! path; files written before it are left in place.

use std::path::Path;

use crate::codegen::RenderedFile;
use crate::diagnostic::ModgenError;

/// Creates `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<(), ModgenError> {
    std::fs::create_dir_all(path).map_err(|e| ModgenError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Writes one file, creating its parent directory first.
pub fn write_file(path: &Path, contents: &str) -> Result<(), ModgenError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    std::fs::write(path, contents).map_err(|e| ModgenError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Writes every file in order. Returns the number written.
pub fn write_all(files: &[RenderedFile]) -> Result<usize, ModgenError> {
    for file in files {
        write_file(&file.path, &file.contents)?;
    }
    Ok(files.len())
}
