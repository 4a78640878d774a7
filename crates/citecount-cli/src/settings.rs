use std::path::PathBuf;

use anyhow::Context;
use citecount_core::config_file::ConfigFile;
use citecount_core::{Config, DecodeMode};

pub const DEFAULT_OUTPUT: &str = "result.csv";

pub const ENV_LOAD_WORKERS: &str = "CITECOUNT_LOAD_WORKERS";
pub const ENV_AGGREGATE_WORKERS: &str = "CITECOUNT_AGGREGATE_WORKERS";
pub const ENV_OUTPUT: &str = "CITECOUNT_OUTPUT";

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub load_workers: Option<usize>,
    pub aggregate_workers: Option<usize>,
    pub lossy: bool,
}

/// Fully resolved run settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub output: PathBuf,
}

/// Resolve settings: CLI flags > environment > config file > defaults.
pub fn resolve(
    overrides: &Overrides,
    file: &ConfigFile,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut config = Config::default();
    file.apply_to(&mut config);
    let mut output = file
        .output_path()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    if let Some(n) = env_usize(&env, ENV_LOAD_WORKERS)? {
        config.load_workers = n;
    }
    if let Some(n) = env_usize(&env, ENV_AGGREGATE_WORKERS)? {
        config.aggregate_workers = n;
    }
    if let Some(path) = env(ENV_OUTPUT).filter(|p| !p.is_empty()) {
        output = PathBuf::from(path);
    }

    if let Some(n) = overrides.load_workers {
        config.load_workers = n;
    }
    if let Some(n) = overrides.aggregate_workers {
        config.aggregate_workers = n;
    }
    if overrides.lossy {
        config.decode = DecodeMode::Lossy;
    }
    if let Some(ref path) = overrides.output {
        output = path.clone();
    }

    config.validate()?;
    Ok(Settings { config, output })
}

fn env_usize(env: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<usize>> {
    match env(name) {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got {v:?}")),
        _ => Ok(None),
    }
}
