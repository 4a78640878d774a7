use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use citecount_core::{OutputRecord, RecordSink, SinkError};

/// Format one record as `<document>,<citation>,<count>\n`.
///
/// Fields are written verbatim. A document name containing a comma yields
/// a line with more than three fields.
pub fn format_record(record: &OutputRecord) -> String {
    format!("{},{},{}\n", record.document, record.citation, record.count)
}

/// Writes one line per record to any byte stream. No header row.
pub struct LineWriter<W: Write + Send> {
    inner: W,
    lines: usize,
}

impl<W: Write + Send> LineWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }

    /// Records successfully handed to the underlying writer.
    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> RecordSink for LineWriter<W> {
    fn write_record(&mut self, record: &OutputRecord) -> Result<(), SinkError> {
        self.inner.write_all(format_record(record).as_bytes())?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Open the output destination. `-` is standard output; any other path is
/// created or truncated.
///
/// Unbuffered: each record reaches the destination in its own
/// `write_record` call, and a failed append is an error for that record.
pub fn open_output(path: &Path) -> io::Result<LineWriter<Box<dyn Write + Send>>> {
    let writer: Box<dyn Write + Send> = if path == Path::new("-") {
        Box::new(io::stdout())
    } else {
        let file = File::create(path)?;
        tracing::debug!(path = %path.display(), "created output file");
        Box::new(file)
    };
    Ok(LineWriter::new(writer))
}
