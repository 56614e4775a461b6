use std::path::PathBuf;

use batcher_core::{BatcherError, HostConfig};
use batcher_exp::Dispatchable;
use tracing::info;

use crate::backend::ExecutionBackend;
use crate::script::{render_local, write_script};

/// Writes the scripts a local run would execute without running them.
#[derive(Debug, Clone)]
pub struct DryRunBackend {
    script_dir: PathBuf,
    launched: usize,
}

impl DryRunBackend {
    pub fn new(script_dir: impl Into<PathBuf>) -> Self {
        Self {
            script_dir: script_dir.into(),
            launched: 0,
        }
    }

    pub fn from_config(config: &HostConfig) -> Self {
        Self::new(config.script_dir.clone())
    }
}

impl ExecutionBackend for DryRunBackend {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn run(&mut self, unit: &dyn Dispatchable) -> Result<String, BatcherError> {
        let script = write_script(&self.script_dir, unit, &render_local(unit)?)?;
        let id = format!("dry-run-{}", self.launched);
        self.launched += 1;
        info!(script = %script.display(), id = %id, "wrote script");
        Ok(id)
    }
}
