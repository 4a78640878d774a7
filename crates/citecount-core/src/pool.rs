//! Load and aggregate worker pools.
//!
//! Architecture: documents flow through three bounded queues.
//! Handles go to a fixed pool of load workers, which read the bytes and pass
//! (handle, bytes) to a fixed pool of aggregate workers, which count citations
//! and emit one [`DocumentReport`] per document. Any idle worker may take any
//! queued item. Every queue is sized to the document count, so producers never
//! wait on a slower downstream stage.

use std::sync::Arc;

use citecount_parsing::{Accumulator, DecodeMode, aggregate_bytes};
use tokio::task::JoinHandle;

use crate::{
    Config, ContentReadFailure, DocumentContent, DocumentHandle, DocumentReport, DocumentSource,
    OutputRecord,
};

/// Item on the content queue. Read failures travel through the aggregate
/// stage so every document still yields exactly one report.
type Loaded = Result<DocumentContent, ContentReadFailure>;

/// A pool of load and aggregate workers.
///
/// Submit handles via [`submit()`](ExtractionPool::submit), call
/// [`close()`](ExtractionPool::close) once every handle is queued, then drain
/// reports with [`next_report()`](ExtractionPool::next_report).
pub struct ExtractionPool {
    handle_tx: async_channel::Sender<DocumentHandle>,
    report_rx: async_channel::Receiver<DocumentReport>,
    pool_handle: JoinHandle<()>,
}

impl ExtractionPool {
    /// Create a pool whose queues hold `capacity` items (at least 1).
    ///
    /// Spawns `config.load_workers` load tasks and `config.aggregate_workers`
    /// aggregate tasks.
    pub fn new(config: &Config, source: Arc<dyn DocumentSource>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (handle_tx, handle_rx) = async_channel::bounded::<DocumentHandle>(capacity);
        let (content_tx, content_rx) = async_channel::bounded::<Loaded>(capacity);
        let (report_tx, report_rx) = async_channel::bounded::<DocumentReport>(capacity);

        let load_workers = config.load_workers.max(1);
        let aggregate_workers = config.aggregate_workers.max(1);
        let decode = config.decode;

        let pool_handle = tokio::spawn(async move {
            let mut load_handles = Vec::with_capacity(load_workers);
            for worker in 0..load_workers {
                load_handles.push(tokio::spawn(load_loop(
                    worker,
                    handle_rx.clone(),
                    content_tx.clone(),
                    Arc::clone(&source),
                )));
            }

            let mut aggregate_handles = Vec::with_capacity(aggregate_workers);
            for worker in 0..aggregate_workers {
                aggregate_handles.push(tokio::spawn(aggregate_loop(
                    worker,
                    content_rx.clone(),
                    report_tx.clone(),
                    decode,
                )));
            }

            // Drop our clones so workers are the last holders: when the load
            // workers exit the content queue closes, and the aggregate workers
            // drain it and exit in turn.
            drop(handle_rx);
            drop(content_tx);
            drop(content_rx);
            drop(report_tx);

            for h in load_handles {
                if let Err(e) = h.await {
                    tracing::error!(error = %e, "load worker terminated abnormally");
                }
            }
            for h in aggregate_handles {
                if let Err(e) = h.await {
                    tracing::error!(error = %e, "aggregate worker terminated abnormally");
                }
            }
        });

        Self {
            handle_tx,
            report_rx,
            pool_handle,
        }
    }

    /// Queue a document for processing.
    pub async fn submit(&self, handle: DocumentHandle) {
        if let Err(e) = self.handle_tx.send(handle).await {
            tracing::warn!(document = %e.into_inner(), "work queue closed, document not submitted");
        }
    }

    /// Signal that no more handles will be submitted.
    pub fn close(&self) {
        self.handle_tx.close();
    }

    /// Receive the next finished report. `None` once every worker has exited.
    pub async fn next_report(&self) -> Option<DocumentReport> {
        self.report_rx.recv().await.ok()
    }

    /// Close the pool and wait for all workers to finish.
    pub async fn shutdown(self) {
        self.handle_tx.close();
        // Unblock aggregate workers if the caller stopped draining early.
        self.report_rx.close();
        let _ = self.pool_handle.await;
    }
}

// ── Load stage ──────────────────────────────────────────────────────────

async fn load_loop(
    worker: usize,
    handle_rx: async_channel::Receiver<DocumentHandle>,
    content_tx: async_channel::Sender<Loaded>,
    source: Arc<dyn DocumentSource>,
) {
    while let Ok(handle) = handle_rx.recv().await {
        let loaded = load_document(handle, &source).await;
        match &loaded {
            Ok(content) => {
                tracing::debug!(
                    worker,
                    document = %content.handle,
                    bytes = content.bytes.len(),
                    "loaded"
                );
            }
            Err(failure) => {
                tracing::warn!(worker, document = failure.document(), error = %failure, "content read failed");
            }
        }

        if content_tx.send(loaded).await.is_err() {
            tracing::debug!(worker, "content queue closed");
            break;
        }
    }
}

/// Read one document on the blocking pool.
async fn load_document(
    handle: DocumentHandle,
    source: &Arc<dyn DocumentSource>,
) -> Result<DocumentContent, ContentReadFailure> {
    let document = handle.name().to_string();
    let source = Arc::clone(source);

    let joined = tokio::task::spawn_blocking(move || {
        let bytes = source.read(&handle);
        (handle, bytes)
    })
    .await;

    match joined {
        Ok((handle, Ok(bytes))) => Ok(DocumentContent { handle, bytes }),
        Ok((_, Err(e))) => Err(ContentReadFailure::Read {
            document,
            message: e.to_string(),
        }),
        Err(e) => Err(ContentReadFailure::Aborted {
            document,
            message: e.to_string(),
        }),
    }
}

// ── Aggregate stage ─────────────────────────────────────────────────────

async fn aggregate_loop(
    worker: usize,
    content_rx: async_channel::Receiver<Loaded>,
    report_tx: async_channel::Sender<DocumentReport>,
    decode: DecodeMode,
) {
    while let Ok(loaded) = content_rx.recv().await {
        let report = match loaded {
            Ok(content) => aggregate_document(worker, content, decode).await,
            Err(failure) => DocumentReport::failed(failure),
        };

        if report_tx.send(report).await.is_err() {
            tracing::debug!(worker, "report queue closed");
            break;
        }
    }
}

/// Decode and scan one document on the blocking pool.
async fn aggregate_document(
    worker: usize,
    content: DocumentContent,
    decode: DecodeMode,
) -> DocumentReport {
    let document = content.handle.name().to_string();

    let joined = tokio::task::spawn_blocking(move || aggregate_bytes(&content.bytes, decode)).await;

    match joined {
        Ok(Ok(acc)) => build_report(worker, document, acc),
        Ok(Err(e)) => {
            let failure = ContentReadFailure::Decode {
                document,
                source: e,
            };
            tracing::warn!(worker, document = failure.document(), error = %failure, "content decode failed");
            DocumentReport::failed(failure)
        }
        Err(e) => {
            let failure = ContentReadFailure::Aborted {
                document,
                message: e.to_string(),
            };
            tracing::error!(worker, document = failure.document(), error = %failure, "aggregation aborted");
            DocumentReport::failed(failure)
        }
    }
}

fn build_report(worker: usize, document: String, acc: Accumulator) -> DocumentReport {
    let scan = acc.stats();
    let records = acc
        .into_counts()
        .into_iter()
        .map(|(citation, count)| OutputRecord {
            document: document.clone(),
            citation,
            count,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        worker,
        document = %document,
        lines = scan.lines,
        citations = scan.matches,
        keys = records.len(),
        merged = scan.merged,
        clamped = scan.clamped,
        "aggregated"
    );

    DocumentReport {
        document,
        records,
        scan,
        failure: None,
    }
}
