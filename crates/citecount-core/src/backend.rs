use std::collections::HashMap;

use thiserror::Error;

use crate::{DocumentHandle, OutputRecord};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for document content readers.
///
/// Implementors provide the raw bytes of a document; decoding and citation
/// counting happen in the aggregate stage. Reads run on the blocking thread
/// pool, so implementations may use synchronous I/O.
pub trait DocumentSource: Send + Sync {
    fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, SourceError>;
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination for output records. Called once per record, from the
/// coordinator only.
pub trait RecordSink: Send {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl RecordSink for Vec<OutputRecord> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }
}

/// In-memory document set keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.documents.insert(name.into(), content.into());
    }

    /// Handles for every stored document, sorted by name.
    pub fn handles(&self) -> Vec<DocumentHandle> {
        let mut names: Vec<&String> = self.documents.keys().collect();
        names.sort();
        names.into_iter().map(DocumentHandle::new).collect()
    }
}

impl DocumentSource for MemorySource {
    fn read(&self, handle: &DocumentHandle) -> Result<Vec<u8>, SourceError> {
        self.documents
            .get(handle.name())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(handle.name().to_string()))
    }
}
