//! Flat directory input.
//!
//! Every regular file directly inside the input directory is one document,
//! named by its file name. Subdirectories are not descended into.

use std::fs;
use std::path::{Path, PathBuf};

use citecount_core::{DocumentHandle, DocumentSource, SourceError};

use crate::IngestError;

/// A document found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub handle: DocumentHandle,
    pub size: u64,
}

/// List the regular files directly inside `dir`, sorted by name.
///
/// Any failure to read the directory or one of its entries is an
/// [`IngestError::Enumeration`]; no partial listing is returned.
pub fn list_documents(dir: &Path) -> Result<Vec<DocumentEntry>, IngestError> {
    let enumeration = |source| IngestError::Enumeration {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(enumeration)? {
        let entry = entry.map_err(enumeration)?;
        let file_type = entry.file_type().map_err(enumeration)?;

        // Follow symlinks so a link to a regular file counts as a document.
        let metadata = if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "skipping dangling link");
                    continue;
                }
            }
        } else {
            entry.metadata().map_err(enumeration)?
        };

        if !metadata.is_file() {
            tracing::debug!(path = %entry.path().display(), "skipping non-file entry");
            continue;
        }

        // The lossy name is only for display; reads use the raw file name.
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().into_owned();
        entries.push(DocumentEntry {
            handle: DocumentHandle::with_path(name, file_name),
            size: metadata.len(),
        });
    }

    entries.sort_by(|a, b| a.handle.name().cmp(b.handle.name()));
    tracing::debug!(path = %dir.display(), documents = entries.len(), "enumerated input");
    Ok(entries)
}

/// Reads documents as files under a base directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    base: PathBuf,
}

impl DirectorySource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl DocumentSource for DirectorySource {
    fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, SourceError> {
        let path = match handle.path() {
            Some(relative) => self.base.join(relative),
            None => self.base.join(handle.name()),
        };
        fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(path.display().to_string()),
            _ => SourceError::Io(e),
        })
    }
}
