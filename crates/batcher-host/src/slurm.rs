use std::path::PathBuf;
use std::process::Command;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::HostConfig;
use batcher_exp::Dispatchable;
use tracing::info;

use crate::backend::ExecutionBackend;
use crate::script::{render_body, write_script};

/// Submits each unit to Slurm with `sbatch`.
///
/// Host options: `partition`, `account`, `nodes` (used when the unit has no
/// `nodes` parameter) and `submit_cmd` (defaults to `sbatch`).
#[derive(Debug, Clone)]
pub struct SlurmBackend {
    script_dir: PathBuf,
    partition: Option<String>,
    account: Option<String>,
    default_nodes: u64,
    submit_cmd: String,
}

impl SlurmBackend {
    pub fn from_config(config: &HostConfig) -> Self {
        Self {
            script_dir: config.script_dir.clone(),
            partition: config.option_str("partition"),
            account: config.option_str("account"),
            default_nodes: config.option_u64("nodes").unwrap_or(1),
            submit_cmd: config
                .option_str("submit_cmd")
                .unwrap_or_else(|| "sbatch".to_string()),
        }
    }

    fn nodes(&self, unit: &dyn Dispatchable) -> Result<u64, BatcherError> {
        match unit.param("nodes") {
            Ok(value) => Ok(value
                .as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(self.default_nodes)),
            Err(err) if err.info().code == "pack.mismatch" => Err(err),
            Err(_) => Ok(self.default_nodes),
        }
    }

    /// Full `#SBATCH` script for `unit`.
    pub fn render(&self, unit: &dyn Dispatchable) -> Result<String, BatcherError> {
        let mut script = String::from("#!/bin/bash\n");
        script.push_str(&format!("#SBATCH -N {}\n", self.nodes(unit)?));
        script.push_str(&format!("#SBATCH -J {}\n", unit.name()?));
        script.push_str(&format!("#SBATCH -t {}\n", unit.wall_time()));
        if let Some(partition) = &self.partition {
            script.push_str(&format!("#SBATCH -p {partition}\n"));
        }
        script.push_str(&format!("#SBATCH -o {}\n", unit.marker()?.display()));
        if let Some(account) = &self.account {
            script.push_str(&format!("#SBATCH -A {account}\n"));
        }
        script.push('\n');
        script.push_str(&render_body(unit, false)?);
        Ok(script)
    }
}

impl ExecutionBackend for SlurmBackend {
    fn name(&self) -> &str {
        "slurm"
    }

    fn run(&mut self, unit: &dyn Dispatchable) -> Result<String, BatcherError> {
        let script = write_script(&self.script_dir, unit, &self.render(unit)?)?;
        let output = Command::new(&self.submit_cmd)
            .arg(&script)
            .output()
            .map_err(|err| {
                BatcherError::Backend(
                    ErrorInfo::new("backend.spawn", err.to_string())
                        .with_context("command", self.submit_cmd.as_str()),
                )
            })?;
        if !output.status.success() {
            return Err(BatcherError::Backend(
                ErrorInfo::new("backend.submit", "job submission failed")
                    .with_context("script", script.display().to_string())
                    .with_context("status", output.status.to_string())
                    .with_context("stderr", String::from_utf8_lossy(&output.stderr).trim()),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let id = stdout.split_whitespace().last().ok_or_else(|| {
            BatcherError::Backend(
                ErrorInfo::new("backend.submit", "submission printed no job id")
                    .with_context("script", script.display().to_string()),
            )
        })?;
        info!(script = %script.display(), job_id = id, "submitted job");
        Ok(id.to_string())
    }
}
