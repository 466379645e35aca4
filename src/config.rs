//! Daemon configuration parameters
//!
//! Defaults match a stock FreeBSD board with an `rcrecv(4)` receiver on the
//! first GPIO controller. Values can come from a JSON file (`-c`) and are
//! then overridden by command-line options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::debounce::DEFAULT_INTERVAL_MS;
use crate::app::mapping::{CodeMapping, MappingTable};
use crate::error::ConfigError;

pub const DEFAULT_RECEIVER_DEVICE: &str = "/dev/rcrecv";
pub const DEFAULT_GPIO_DEVICE: &str = "/dev/gpioc0";
pub const DEFAULT_PID_FILE: &str = "/var/run/rcgpiod.pid";
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 10_000;

/// Core daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    // --- Devices ---
    /// Remote-control receiver device
    pub receiver_device: PathBuf,
    /// GPIO controller device
    pub gpio_device: PathBuf,

    // --- Timing ---
    /// Minimum interval between two accepted identical codes (ms)
    pub interval_ms: u64,
    /// Upper bound on one readiness wait (ms)
    pub poll_timeout_ms: u64,

    // --- Process ---
    /// Detach from the controlling session
    pub background: bool,
    /// Single-instance lock file
    pub pid_file: PathBuf,
    /// Debug-level logging
    pub verbose: bool,

    // --- Mappings ---
    /// Code → pin actions, first match wins
    pub mappings: Vec<CodeMapping>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            receiver_device: PathBuf::from(DEFAULT_RECEIVER_DEVICE),
            gpio_device: PathBuf::from(DEFAULT_GPIO_DEVICE),

            interval_ms: DEFAULT_INTERVAL_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,

            background: false,
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            verbose: false,

            mappings: Vec::new(),
        }
    }
}

impl DaemonConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout_ms == 0 {
            return Err(ConfigError::Invalid("poll timeout must be non-zero"));
        }
        Ok(())
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Freeze the configured mappings into the dispatch table.
    pub fn mapping_table(&self) -> MappingTable {
        self.mappings.iter().copied().collect()
    }
}
