//! Logger configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage;

/// Configuration for a single [`ExperimentLogger`](crate::ExperimentLogger).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Directory receiving the text log, event files and dumps
    pub log_dir: PathBuf,
    /// Number of samples a caller intends to log per call (default: 10)
    pub n_logged_samples: usize,
    /// Flush the summary writer at least every N seconds (default: 1)
    pub flush_secs: u64,
    /// Flush the summary writer once N writes are pending (default: 1)
    pub max_queue: usize,
    /// File name of the text log inside `log_dir`
    pub text_log_name: String,
    /// File name `dump_scalars` writes to when no path is given
    pub scalar_dump_name: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            n_logged_samples: 10,
            flush_secs: 1,
            max_queue: 1,
            text_log_name: "log.log".to_string(),
            scalar_dump_name: "scalar_data.json".to_string(),
        }
    }
}

impl LoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_n_logged_samples(mut self, n: usize) -> Self {
        self.n_logged_samples = n;
        self
    }

    pub fn with_flush_secs(mut self, secs: u64) -> Self {
        self.flush_secs = secs;
        self
    }

    pub fn with_max_queue(mut self, max_queue: usize) -> Self {
        self.max_queue = max_queue;
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_secs)
    }

    pub fn text_log_path(&self) -> PathBuf {
        self.log_dir.join(&self.text_log_name)
    }

    pub fn scalar_dump_path(&self) -> PathBuf {
        self.log_dir.join(&self.scalar_dump_name)
    }

    /// Load a config from YAML. Missing fields take their defaults.
    pub fn load_yaml(path: &Path) -> Result<Self> {
        storage::load_yaml(path)
    }

    pub fn save_yaml(&self, path: &Path) -> Result<()> {
        storage::save_yaml(path, self)
    }
}
