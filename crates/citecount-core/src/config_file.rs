use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Config, ConfigError, DecodeMode};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub concurrency: Option<ConcurrencyConfig>,
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub load_workers: Option<usize>,
    pub aggregate_workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub lossy_decode: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
}

impl ConfigFile {
    /// Overlay the values present in this file onto `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref c) = self.concurrency {
            if let Some(n) = c.load_workers {
                config.load_workers = n;
            }
            if let Some(n) = c.aggregate_workers {
                config.aggregate_workers = n;
            }
        }
        if let Some(lossy) = self.input.as_ref().and_then(|i| i.lossy_decode) {
            config.decode = if lossy {
                DecodeMode::Lossy
            } else {
                DecodeMode::Strict
            };
        }
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .as_ref()
            .and_then(|o| o.path.as_ref())
            .map(PathBuf::from)
    }
}

/// Platform config directory path: `<config_dir>/citecount/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citecount").join("config.toml"))
}

/// Load config by cascading CWD `.citecount.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citecount.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    match read_config(path) {
        Ok(config) => Some(config),
        Err(e) => {
            if path.exists() {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
            }
            None
        }
    }
}

/// Read a config file that the user asked for explicitly. Unlike
/// [`load_from_path`], a missing or malformed file is an error.
pub fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::File {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        concurrency: Some(ConcurrencyConfig {
            load_workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.load_workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.load_workers)),
            aggregate_workers: overlay
                .concurrency
                .as_ref()
                .and_then(|c| c.aggregate_workers)
                .or_else(|| base.concurrency.as_ref().and_then(|c| c.aggregate_workers)),
        }),
        input: Some(InputConfig {
            lossy_decode: overlay
                .input
                .as_ref()
                .and_then(|i| i.lossy_decode)
                .or_else(|| base.input.as_ref().and_then(|i| i.lossy_decode)),
        }),
        output: Some(OutputConfig {
            path: overlay
                .output
                .as_ref()
                .and_then(|o| o.path.clone())
                .or_else(|| base.output.as_ref().and_then(|o| o.path.clone())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_toml() {
        let toml_str = "[concurrency]\nload_workers = 8\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let concurrency = parsed.concurrency.unwrap();
        assert_eq!(concurrency.load_workers, Some(8));
        assert!(concurrency.aggregate_workers.is_none());
        assert!(parsed.input.is_none());
    }

    #[test]
    fn apply_overrides_only_present_fields() {
        let file = ConfigFile {
            concurrency: Some(ConcurrencyConfig {
                aggregate_workers: Some(3),
                ..Default::default()
            }),
            input: Some(InputConfig {
                lossy_decode: Some(true),
            }),
            ..Default::default()
        };
        let mut config = Config {
            load_workers: 7,
            aggregate_workers: 1,
            decode: DecodeMode::Strict,
        };
        file.apply_to(&mut config);
        assert_eq!(config.load_workers, 7);
        assert_eq!(config.aggregate_workers, 3);
        assert_eq!(config.decode, DecodeMode::Lossy);
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            concurrency: Some(ConcurrencyConfig {
                load_workers: Some(4),
                aggregate_workers: Some(4),
            }),
            output: Some(OutputConfig {
                path: Some("/base/result.csv".to_string()),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            concurrency: Some(ConcurrencyConfig {
                load_workers: Some(16),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        let concurrency = merged.concurrency.clone().unwrap();
        assert_eq!(concurrency.load_workers, Some(16));
        assert_eq!(concurrency.aggregate_workers, Some(4));
        assert_eq!(
            merged.output_path(),
            Some(PathBuf::from("/base/result.csv"))
        );
    }

    #[test]
    fn read_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }

    #[test]
    fn read_config_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[concurrency]\nload_workers = \"many\"\n").unwrap();
        assert!(read_config(&path).is_err());
        assert!(load_from_path(&path).is_none());
    }

    #[test]
    fn read_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = ConfigFile {
            output: Some(OutputConfig {
                path: Some("out.csv".to_string()),
            }),
            ..Default::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let parsed = read_config(&path).unwrap();
        assert_eq!(parsed.output_path(), Some(PathBuf::from("out.csv")));
    }
}
