//! Run configuration threaded through loading, dispatch and aggregation.
//!
//! The file is YAML; plain JSON documents parse as well.
//!
//! ```yaml
//! host:
//!   type: slurm
//!   partition: main
//!   account: proj01
//! modules:
//!   binary:
//!     out_dir: /scratch/runs
//!     stats:
//!       ipc: "grep IPC {stdout} | cut -d' ' -f2"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{BatcherError, ErrorInfo};

/// Top-level configuration for one batcher invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BatcherConfig {
    /// Execution backend selection and its options.
    #[serde(default)]
    pub host: HostConfig,
    /// Per-module settings keyed by module name.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleConfig>,
}

impl BatcherConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, BatcherError> {
        let text =
            fs::read_to_string(path).map_err(|err| BatcherError::io("config.read", path, err))?;
        Self::from_yaml_str(&text).map_err(|err| match err {
            BatcherError::Config(info) => {
                BatcherError::Config(info.with_context("path", path.display().to_string()))
            }
            other => other,
        })
    }

    /// Parses a configuration document.
    pub fn from_yaml_str(text: &str) -> Result<Self, BatcherError> {
        serde_yaml::from_str(text).map_err(|err| {
            BatcherError::Config(ErrorInfo::new("config.parse", err.to_string()))
        })
    }

    /// Returns the settings for `module`, or defaults when it is not configured.
    pub fn module(&self, module: &str) -> ModuleConfig {
        self.modules.get(module).cloned().unwrap_or_default()
    }
}

/// Execution backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Registry name of the backend (`local`, `slurm`, `dry-run`).
    #[serde(rename = "type", default = "HostConfig::default_kind")]
    pub kind: String,
    /// Directory receiving generated job scripts.
    #[serde(default = "HostConfig::default_script_dir")]
    pub script_dir: PathBuf,
    /// Backend specific options (partition, account, nodes, ...).
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl HostConfig {
    fn default_kind() -> String {
        "local".to_string()
    }

    fn default_script_dir() -> PathBuf {
        PathBuf::from(".")
    }

    /// Returns a string option, rendering numbers as text.
    pub fn option_str(&self, key: &str) -> Option<String> {
        match self.options.get(key)? {
            Value::String(text) => Some(text.clone()),
            Value::Number(num) => Some(num.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    /// Returns an unsigned integer option.
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        match self.options.get(key)? {
            Value::Number(num) => num.as_u64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            kind: Self::default_kind(),
            script_dir: Self::default_script_dir(),
            options: BTreeMap::new(),
        }
    }
}

/// Settings for one job module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Root under which job working directories are created.
    #[serde(default = "ModuleConfig::default_out_dir", alias = "OUT_DIR")]
    pub out_dir: PathBuf,
    /// Stat name to shell command template used during aggregation.
    #[serde(default)]
    pub stats: BTreeMap<String, String>,
    /// Module specific options (e.g. `replicas`).
    #[serde(flatten)]
    pub options: BTreeMap<String, Value>,
}

impl ModuleConfig {
    fn default_out_dir() -> PathBuf {
        PathBuf::from(".")
    }

    /// Returns an unsigned integer option.
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(Value::as_u64)
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            out_dir: Self::default_out_dir(),
            stats: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }
}
