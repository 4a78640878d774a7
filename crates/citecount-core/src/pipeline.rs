use std::sync::Arc;
use std::time::Instant;

use crate::pool::ExtractionPool;
use crate::{
    Config, CoreError, DocumentHandle, DocumentSource, ProgressEvent, RecordSink, RunStats,
};

/// Extract and count citations for a batch of documents.
///
/// Creates an internal [`ExtractionPool`] with queues sized to the number of
/// handles, submits every handle exactly once, then collects exactly one
/// report per document and forwards its records to `sink`. Read, decode and
/// write failures are reported through logging and `progress` and never stop
/// the run. Fails only on invalid configuration, or if the pool shuts down
/// before every document has been accounted for.
pub async fn extract_citations(
    handles: Vec<DocumentHandle>,
    config: &Config,
    source: Arc<dyn DocumentSource>,
    sink: &mut dyn RecordSink,
    progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
) -> Result<RunStats, CoreError> {
    config.validate()?;

    let started = Instant::now();
    let total = handles.len();
    let mut stats = RunStats {
        documents: total,
        ..RunStats::default()
    };

    tracing::debug!(
        documents = total,
        load_workers = config.load_workers,
        aggregate_workers = config.aggregate_workers,
        "starting extraction"
    );

    let pool = ExtractionPool::new(config, source, total);
    for handle in handles {
        pool.submit(handle).await;
    }
    pool.close();

    for received in 0..total {
        let Some(report) = pool.next_report().await else {
            tracing::error!(expected = total, received, "pipeline closed early");
            return Err(CoreError::PipelineClosed {
                expected: total,
                received,
            });
        };

        if let Some(ref failure) = report.failure {
            stats.failed += 1;
            progress(ProgressEvent::Failed {
                failure: failure.clone(),
            });
        }

        stats.citations += report.scan.matches;
        stats.records += report.records.len();

        for record in &report.records {
            match sink.write_record(record) {
                Ok(()) => stats.records_written += 1,
                Err(e) => {
                    stats.write_failures += 1;
                    tracing::warn!(
                        document = %record.document,
                        citation = %record.citation,
                        error = %e,
                        "failed to write record"
                    );
                    progress(ProgressEvent::WriteFailed {
                        document: record.document.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        progress(ProgressEvent::Completed {
            done: received + 1,
            total,
            document: report.document,
            records: report.records.len(),
            citations: report.scan.matches,
        });
    }

    pool.shutdown().await;

    if let Err(e) = sink.flush() {
        stats.write_failures += 1;
        tracing::warn!(error = %e, "failed to flush output");
        progress(ProgressEvent::WriteFailed {
            document: String::new(),
            error: e.to_string(),
        });
    }

    stats.elapsed = started.elapsed();
    tracing::info!(
        documents = stats.documents,
        failed = stats.failed,
        citations = stats.citations,
        records = stats.records,
        write_failures = stats.write_failures,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "extraction complete"
    );

    Ok(stats)
}
