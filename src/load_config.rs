//! `load_config` module: Loads a static YAML config into the options the importer runs with.
//!
//! This module is the only place where user YAML is parsed and mapped to
//! strongly-typed structs. Secrets never live in the YAML: the store client
//! reads them from the environment (see [`crate::firestore`]).
//!
//! # Errors
//! All errors use `anyhow::Error` for context-rich diagnostics and are surfaced at the CLI boundary.

use anyhow::Result;
use scripture_import_core::config::ImportOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    /// Directory holding one subdirectory per work. Relative paths are resolved against the config file.
    pub source_root: PathBuf,
    /// Works to import, in order, named exactly as their directories.
    pub works: Vec<String>,
    #[serde(flatten)]
    pub import: ImportOptions,
    #[serde(default)]
    pub store: StoreSection,
}

/// Where records are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreSection {
    Firestore(FirestoreSection),
    Jsonl { output_dir: PathBuf },
}

impl Default for StoreSection {
    fn default() -> Self {
        StoreSection::Firestore(FirestoreSection::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FirestoreSection {
    /// Overrides the `project_id` of the credentials file.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Database id, `(default)` when unset.
    #[serde(default)]
    pub database: Option<String>,
}

/// Loads a static YAML config file (no secrets).
/// Returns the config with `source_root` (and a JSONL `output_dir`) made absolute relative to the file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.works.is_empty() {
        error!(config_path = ?path_ref, "Config lists no works");
        anyhow::bail!("Config {:?} lists no works to import", path_ref);
    }

    let base = path_ref.parent().unwrap_or_else(|| Path::new(""));
    config.source_root = base.join(&config.source_root);
    if let StoreSection::Jsonl { output_dir } = &mut config.store {
        *output_dir = base.join(&*output_dir);
    }

    info!(
        source_root = %config.source_root.display(),
        works = config.works.len(),
        store = ?config.store,
        "Config loaded successfully"
    );
    Ok(config)
}
