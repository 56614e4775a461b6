use std::path::PathBuf;
use std::process::Command;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::HostConfig;
use batcher_exp::Dispatchable;
use tracing::{info, warn};

use crate::backend::ExecutionBackend;
use crate::script::{render_local, write_script};

/// Runs each unit with `bash` on this machine, waiting for it to finish.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    script_dir: PathBuf,
}

impl LocalBackend {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.script_dir.clone())
    }
}

impl ExecutionBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    fn run(&mut self, unit: &dyn Dispatchable) -> Result<String, BatcherError> {
        let script = write_script(&self.script_dir, unit, &render_local(unit)?)?;
        let spawn_error = |err: std::io::Error| {
            BatcherError::Backend(
                ErrorInfo::new("backend.spawn", err.to_string())
                    .with_context("script", script.display().to_string()),
            )
        };
        let mut child = Command::new("bash").arg(&script).spawn().map_err(spawn_error)?;
        let pid = child.id();
        let status = child.wait().map_err(spawn_error)?;
        if status.success() {
            info!(script = %script.display(), pid, "local job finished");
        } else {
            warn!(script = %script.display(), pid, %status, "local job exited with failure");
        }
        Ok(format!("local-{pid}"))
    }
}
