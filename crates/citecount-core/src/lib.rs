use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod pipeline;
pub mod pool;

// Re-export for convenience
pub use backend::{DocumentSource, MemorySource, RecordSink, SinkError, SourceError};
pub use citecount_parsing::{CitationKey, DecodeError, DecodeMode, ScanStats};
pub use pipeline::extract_citations;
pub use pool::ExtractionPool;

/// Default number of load workers.
pub const DEFAULT_LOAD_WORKERS: usize = 32;

/// Default number of aggregate workers: one per available core, or 4 if
/// the parallelism cannot be queried.
pub fn default_aggregate_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Identifier of a document to process (its name within the input set).
///
/// The name is what appears in output records. A handle may also carry the
/// exact path to read, relative to its source, when that path cannot be
/// recovered from the name (e.g. a file name that is not valid UTF-8).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentHandle {
    name: String,
    path: Option<PathBuf>,
}

impl DocumentHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }

    pub fn with_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Raw bytes of one loaded document, owned by the aggregate task that receives it.
#[derive(Debug)]
pub struct DocumentContent {
    pub handle: DocumentHandle,
    pub bytes: Vec<u8>,
}

/// One output row: a citation and how often it occurs in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub document: String,
    pub citation: CitationKey,
    pub count: usize,
}

/// A document whose content could not be turned into citations.
///
/// Never fatal: the document still produces an (empty) report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentReadFailure {
    #[error("failed to read {document}: {message}")]
    Read { document: String, message: String },
    #[error("{document} could not be decoded: {source}")]
    Decode {
        document: String,
        source: DecodeError,
    },
    #[error("processing of {document} aborted: {message}")]
    Aborted { document: String, message: String },
}

impl ContentReadFailure {
    pub fn document(&self) -> &str {
        match self {
            Self::Read { document, .. }
            | Self::Decode { document, .. }
            | Self::Aborted { document, .. } => document,
        }
    }
}

/// The result set of a single document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub document: String,
    pub records: Vec<OutputRecord>,
    pub scan: ScanStats,
    pub failure: Option<ContentReadFailure>,
}

impl DocumentReport {
    /// An empty report standing in for a document that could not be processed.
    pub fn failed(failure: ContentReadFailure) -> Self {
        Self {
            document: failure.document().to_string(),
            records: vec![],
            scan: ScanStats::default(),
            failure: Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{stage} pool size must be at least 1")]
    ZeroWorkers { stage: &'static str },
    #[error("invalid config file {path}: {message}")]
    File { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("pipeline closed after {received} of {expected} documents")]
    PipelineClosed { expected: usize, received: usize },
}

/// Progress events emitted by the coordinator.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A document could not be read or decoded. Emitted before its `Completed`.
    Failed { failure: ContentReadFailure },
    /// A record could not be handed to the sink.
    WriteFailed { document: String, error: String },
    /// A document's result set has been collected and written.
    Completed {
        done: usize,
        total: usize,
        document: String,
        records: usize,
        citations: usize,
    },
}

/// Summary statistics for a complete run.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub documents: usize,
    pub failed: usize,
    /// Raw citation matches across all documents.
    pub citations: usize,
    pub records: usize,
    pub records_written: usize,
    pub write_failures: usize,
    pub elapsed: Duration,
}

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    pub load_workers: usize,
    pub aggregate_workers: usize,
    pub decode: DecodeMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_workers: DEFAULT_LOAD_WORKERS,
            aggregate_workers: default_aggregate_workers(),
            decode: DecodeMode::Strict,
        }
    }
}

impl Config {
    /// Reject pool sizes of zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.load_workers == 0 {
            return Err(ConfigError::ZeroWorkers { stage: "load" });
        }
        if self.aggregate_workers == 0 {
            return Err(ConfigError::ZeroWorkers { stage: "aggregate" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.load_workers, DEFAULT_LOAD_WORKERS);
        assert!(config.aggregate_workers >= 1);
        assert_eq!(config.decode, DecodeMode::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = Config {
            load_workers: 0,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroWorkers { stage: "load" })
        );

        let config = Config {
            aggregate_workers: 0,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroWorkers { stage: "aggregate" })
        );
    }

    #[test]
    fn failed_report_is_empty() {
        let report = DocumentReport::failed(ContentReadFailure::Read {
            document: "a.txt".into(),
            message: "permission denied".into(),
        });
        assert_eq!(report.document, "a.txt");
        assert!(report.records.is_empty());
        assert!(report.is_failed());
        assert_eq!(report.scan.matches, 0);
    }
}
