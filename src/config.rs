// ABOUTME: Run configuration shared by the dump and import commands
// ABOUTME: Layers CLI options over an optional TOML file and built-in defaults

use crate::error::{MigratorError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Rows fetched per page when nothing else is configured
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Everything a command needs to run, passed explicitly to each handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorConfig {
    /// Directory holding `<table>.json` dump files
    pub dump_dir: PathBuf,
    /// LibertySoil connection string; `None` means built-in defaults
    pub ls_conn: Option<String>,
    /// FreeFeed connection string; `None` means built-in defaults
    pub ff_conn: Option<String>,
    pub batch_size: usize,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from("."),
            ls_conn: None,
            ff_conn: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Options given on the command line; unset ones fall through to the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dump_dir: Option<PathBuf>,
    pub ls_conn: Option<String>,
    pub ff_conn: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    dump_dir: Option<PathBuf>,
    batch_size: Option<usize>,
    #[serde(default)]
    libertysoil: DatabaseSection,
    #[serde(default)]
    freefeed: DatabaseSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    connection: Option<String>,
}

impl MigratorConfig {
    /// Build the configuration for one run.
    ///
    /// Precedence: CLI flag, then config file, then built-in default.
    pub fn resolve(overrides: CliOverrides, config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => load_file(path)?,
            None => FileConfig::default(),
        };

        let config = Self {
            dump_dir: overrides
                .dump_dir
                .or(file.dump_dir)
                .unwrap_or_else(|| PathBuf::from(".")),
            ls_conn: overrides.ls_conn.or(file.libertysoil.connection),
            ff_conn: overrides.ff_conn.or(file.freefeed.connection),
            batch_size: overrides
                .batch_size
                .or(file.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
        };

        if config.batch_size == 0 {
            return Err(MigratorError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }

    /// Path of the dump file named `file_name` inside the dump directory
    pub fn dump_path(&self, file_name: &str) -> PathBuf {
        self.dump_dir.join(file_name)
    }
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path).map_err(|e| {
        MigratorError::Config(format!(
            "failed to read config file at {}: {}",
            path.display(),
            e
        ))
    })?;
    toml::from_str(&raw).map_err(|e| {
        MigratorError::Config(format!(
            "failed to parse TOML config at {}: {}",
            path.display(),
            e
        ))
    })
}
