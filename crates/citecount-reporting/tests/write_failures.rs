//! A destination that starts failing partway through a run.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use citecount_core::{Config, DecodeMode, MemorySource, ProgressEvent, extract_citations};
use citecount_reporting::LineWriter;

/// Accepts `remaining` writes, then fails every later one.
struct FailAfter {
    remaining: usize,
    written: Vec<u8>,
}

impl Write for FailAfter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Err(io::Error::other("no space left on device"));
        }
        self.remaining -= 1;
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn every_failed_record_is_counted() {
    let mut source = MemorySource::new();
    source.insert("a.txt", "410 U.S. 113\n347 U.S. 483\n5 U.S. 137\n");
    source.insert("b.txt", "1 U.S. 1\n2 U.S. 2\n");
    let handles = source.handles();

    let config = Config {
        load_workers: 2,
        aggregate_workers: 2,
        decode: DecodeMode::Strict,
    };
    let failed_writes = Arc::new(AtomicUsize::new(0));
    let progress = {
        let failed_writes = Arc::clone(&failed_writes);
        move |event: ProgressEvent| {
            if let ProgressEvent::WriteFailed { .. } = event {
                failed_writes.fetch_add(1, Ordering::SeqCst);
            }
        }
    };

    let mut sink = LineWriter::new(FailAfter {
        remaining: 2,
        written: Vec::new(),
    });
    let stats = extract_citations(handles, &config, Arc::new(source), &mut sink, progress)
        .await
        .unwrap();

    assert_eq!(stats.records, 5);
    assert_eq!(stats.records_written, 2);
    assert_eq!(stats.write_failures, 3);
    assert_eq!(failed_writes.load(Ordering::SeqCst), 3);
    assert_eq!(sink.lines(), 2);

    let written = String::from_utf8(sink.into_inner().written).unwrap();
    assert_eq!(written.lines().count(), 2);
}
