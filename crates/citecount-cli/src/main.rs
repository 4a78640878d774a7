use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use citecount_core::config_file;
use citecount_core::{ProgressEvent, extract_citations};
use citecount_ingest::{DirectorySource, list_documents};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

mod output;
mod settings;

use output::ColorMode;
use settings::Overrides;

/// Count U.S. Reports citations in every text file of a directory
#[derive(Parser, Debug)]
#[command(name = "citecount", version, about, long_about = None)]
struct Cli {
    /// Directory whose regular files are scanned (not recursive)
    input_dir: PathBuf,

    /// Output file, or `-` for stdout [default: result.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of concurrent file readers [default: 32]
    #[arg(long)]
    load_workers: Option<usize>,

    /// Number of concurrent citation counters [default: available cores]
    #[arg(long)]
    aggregate_workers: Option<usize>,

    /// Replace invalid UTF-8 instead of skipping the file
    #[arg(long)]
    lossy: bool,

    /// Read configuration from this TOML file instead of the default locations
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let started = Instant::now();

    // Resolve configuration: CLI flags > env vars > config file > defaults
    let file = match cli.config {
        Some(ref path) => config_file::read_config(path)?,
        None => config_file::load_config(),
    };
    let overrides = Overrides {
        output: cli.output.clone(),
        load_workers: cli.load_workers,
        aggregate_workers: cli.aggregate_workers,
        lossy: cli.lossy,
    };
    let settings = settings::resolve(&overrides, &file, |name| std::env::var(name).ok())?;
    tracing::debug!(?settings, "resolved settings");

    // Status text goes to stdout unless stdout carries the records.
    let to_stdout = settings.output.as_os_str() == "-";
    let (mut status, interactive): (Box<dyn Write + Send>, bool) = if to_stdout {
        (Box::new(std::io::stderr()), std::io::stderr().is_terminal())
    } else {
        (Box::new(std::io::stdout()), std::io::stdout().is_terminal())
    };
    let color = ColorMode(!cli.no_color && interactive);

    writeln!(status, "Initiating...")?;
    let entries = list_documents(&cli.input_dir)?;
    output::print_found(&mut status, &cli.input_dir, entries.len())?;

    let mut sink = citecount_reporting::open_output(&settings.output)
        .with_context(|| format!("cannot create output file {}", settings.output.display()))?;

    writeln!(status, "Processing...")?;
    status.flush()?;

    let bar = if cli.no_progress || !std::io::stderr().is_terminal() {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(entries.len() as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.green/dim}] {pos}/{len} files ({eta}) {msg}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    };

    let status = Arc::new(Mutex::new(status));
    let progress_cb = {
        let bar = bar.clone();
        let status = Arc::clone(&status);
        move |event: ProgressEvent| {
            let line = match event {
                ProgressEvent::Completed { done, document, .. } => {
                    bar.set_position(done as u64);
                    bar.set_message(document);
                    return;
                }
                ProgressEvent::Failed { failure } => output::failure_line(&failure, color),
                ProgressEvent::WriteFailed { document, error } => {
                    output::write_failure_line(&document, &error, color)
                }
            };
            if bar.is_hidden() {
                if let Ok(mut w) = status.lock() {
                    let _ = writeln!(w, "{line}");
                }
            } else {
                bar.println(line);
            }
        }
    };

    let handles = entries.into_iter().map(|e| e.handle).collect();
    let source = Arc::new(DirectorySource::new(&cli.input_dir));
    let stats = extract_citations(handles, &settings.config, source, &mut sink, progress_cb).await?;
    bar.finish_and_clear();
    drop(sink);

    let mut status = status
        .lock()
        .map_err(|_| anyhow::anyhow!("status writer poisoned"))?;
    output::print_summary(
        &mut *status,
        &stats,
        &settings.output,
        started.elapsed(),
        color,
    )?;
    status.flush()?;

    if stats.write_failures > 0 {
        anyhow::bail!(
            "{} of {} records could not be written to {}",
            stats.write_failures,
            stats.records,
            settings.output.display()
        );
    }
    Ok(())
}
