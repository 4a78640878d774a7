use std::path::PathBuf;

use thiserror::Error;

pub mod directory;

// Re-export domain types for convenience
pub use citecount_core::{DocumentHandle, DocumentSource, SourceError};
pub use directory::{DirectorySource, DocumentEntry, list_documents};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot list input directory {}: {source}", path.display())]
    Enumeration {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
