use std::io::Write;
use std::path::Path;
use std::time::Duration;

use citecount_core::{ContentReadFailure, RunStats};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the enumeration result.
pub fn print_found(w: &mut dyn Write, input_dir: &Path, files: usize) -> std::io::Result<()> {
    writeln!(w, "Found {} files in {}", files, input_dir.display())
}

/// One-line description of a document that produced no records.
pub fn failure_line(failure: &ContentReadFailure, color: ColorMode) -> String {
    let label = match failure {
        ContentReadFailure::Read { .. } => "UNREADABLE",
        ContentReadFailure::Decode { .. } => "NOT UTF-8",
        ContentReadFailure::Aborted { .. } => "ABORTED",
    };
    if color.enabled() {
        format!("{} {}", format!("{label}:").yellow(), failure)
    } else {
        format!("{label}: {failure}")
    }
}

/// One-line description of a record that could not be written.
pub fn write_failure_line(document: &str, error: &str, color: ColorMode) -> String {
    let msg = if document.is_empty() {
        format!("output flush failed: {error}")
    } else {
        format!("could not write record for {document}: {error}")
    };
    if color.enabled() {
        format!("{} {}", "WRITE ERROR:".red(), msg)
    } else {
        format!("WRITE ERROR: {msg}")
    }
}

/// Print the final summary block.
pub fn print_summary(
    w: &mut dyn Write,
    stats: &RunStats,
    output: &Path,
    total_time: Duration,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", "SUMMARY".bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "SUMMARY")?;
        writeln!(w, "{}", sep)?;
    }

    writeln!(w, "  Documents processed: {}", stats.documents)?;
    if stats.failed > 0 {
        let msg = format!("Documents without results (unreadable): {}", stats.failed);
        if color.enabled() {
            writeln!(w, "  {}", msg.yellow())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w, "  Citations found: {}", stats.citations)?;
    writeln!(w, "  Distinct citations (records): {}", stats.records)?;
    if stats.write_failures > 0 {
        let msg = format!("Records not written: {}", stats.write_failures);
        if color.enabled() {
            writeln!(w, "  {}", msg.red())?;
        } else {
            writeln!(w, "  {}", msg)?;
        }
    }
    writeln!(w)?;

    if output == Path::new("-") {
        writeln!(w, "Wrote {} records to stdout", stats.records_written)?;
    } else if color.enabled() {
        writeln!(w, "Created {}", output.display().bold())?;
    } else {
        writeln!(w, "Created {}", output.display())?;
    }
    writeln!(w, "Total processing time: {:.3}s", total_time.as_secs_f64())?;
    Ok(())
}
