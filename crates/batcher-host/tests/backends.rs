use std::fs;
use std::path::{Path, PathBuf};

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::{HostConfig, ParamValue};
use batcher_exp::Dispatchable;
use batcher_host::{
    render_local, BackendRegistry, DryRunBackend, ExecutionBackend, LocalBackend, SlurmBackend,
};
use serde_json::json;
use tempfile::tempdir;

struct FakeUnit {
    name: String,
    cmd: String,
    marker: PathBuf,
    nodes: Option<i64>,
}

impl FakeUnit {
    fn new(dir: &Path, name: &str, cmd: &str) -> Self {
        Self {
            name: name.to_string(),
            cmd: cmd.to_string(),
            marker: dir.join("out").join(format!("{name}.out")),
            nodes: None,
        }
    }
}

impl Dispatchable for FakeUnit {
    fn name(&self) -> Result<String, BatcherError> {
        Ok(self.name.clone())
    }

    fn cmd_line(&self) -> Result<String, BatcherError> {
        Ok(self.cmd.clone())
    }

    fn env(&self) -> Result<String, BatcherError> {
        Ok("export MODE=test".to_string())
    }

    fn app_dir(&self) -> Result<String, BatcherError> {
        Ok(String::new())
    }

    fn wall_time(&self) -> String {
        "00:05:00".to_string()
    }

    fn marker(&self) -> Result<PathBuf, BatcherError> {
        Ok(self.marker.clone())
    }

    fn param(&self, name: &str) -> Result<ParamValue, BatcherError> {
        match (name, self.nodes) {
            ("nodes", Some(n)) => Ok(ParamValue::Int(n)),
            _ => Err(BatcherError::Template(ErrorInfo::new(
                "template.missing_param",
                "no such parameter",
            ))),
        }
    }
}

fn host(kind: &str, script_dir: &Path, options: serde_json::Value) -> HostConfig {
    let mut config = HostConfig {
        kind: kind.to_string(),
        script_dir: script_dir.to_path_buf(),
        ..HostConfig::default()
    };
    if let serde_json::Value::Object(map) = options {
        config.options.extend(map);
    }
    config
}

#[test]
fn local_script_redirects_into_marker() {
    let dir = tempdir().expect("tempdir");
    let unit = FakeUnit::new(dir.path(), "hello", "echo $MODE");
    let script = render_local(&unit).expect("render");
    assert!(script.starts_with("#!/bin/bash\n"));
    assert!(script.contains("export MODE=test\n"));
    assert!(script.contains(&format!("}} > {} 2>&1", unit.marker.display())));
}

#[test]
fn local_backend_runs_script_and_writes_marker() {
    let dir = tempdir().expect("tempdir");
    let unit = FakeUnit::new(dir.path(), "hello", "echo $MODE");
    let mut backend = LocalBackend::new(dir.path().join("scripts"));
    let id = backend.run(&unit).expect("run");
    assert!(id.starts_with("local-"));
    assert!(dir.path().join("scripts/hello.job").is_file());
    let out = fs::read_to_string(&unit.marker).expect("marker");
    assert_eq!(out.trim(), "test");
}

#[test]
fn slurm_script_uses_param_nodes_and_host_options() {
    let dir = tempdir().expect("tempdir");
    let mut unit = FakeUnit::new(dir.path(), "big", "srun ./app");
    unit.nodes = Some(4);
    let backend = SlurmBackend::from_config(&host(
        "slurm",
        dir.path(),
        json!({"partition": "main", "account": "proj01"}),
    ));
    let script = backend.render(&unit).expect("render");
    assert!(script.contains("#SBATCH -N 4\n"));
    assert!(script.contains("#SBATCH -J big\n"));
    assert!(script.contains("#SBATCH -t 00:05:00\n"));
    assert!(script.contains("#SBATCH -p main\n"));
    assert!(script.contains("#SBATCH -A proj01\n"));
    assert!(script.trim_end().ends_with("srun ./app"));
}

#[test]
fn slurm_nodes_fall_back_to_host_option() {
    let dir = tempdir().expect("tempdir");
    let unit = FakeUnit::new(dir.path(), "small", "./app");
    let backend = SlurmBackend::from_config(&host("slurm", dir.path(), json!({"nodes": 2})));
    let script = backend.render(&unit).expect("render");
    assert!(script.contains("#SBATCH -N 2\n"));
    assert!(!script.contains("#SBATCH -p"));
}

#[test]
fn slurm_returns_last_token_of_submit_output() {
    let dir = tempdir().expect("tempdir");
    let unit = FakeUnit::new(dir.path(), "sub", "./app");
    let mut backend = SlurmBackend::from_config(&host(
        "slurm",
        dir.path(),
        json!({"submit_cmd": "echo"}),
    ));
    let id = backend.run(&unit).expect("submit");
    assert_eq!(PathBuf::from(id), dir.path().join("sub.job"));
}

#[test]
fn failed_submission_is_a_backend_error() {
    let dir = tempdir().expect("tempdir");
    let unit = FakeUnit::new(dir.path(), "sub", "./app");
    let mut backend = SlurmBackend::from_config(&host(
        "slurm",
        dir.path(),
        json!({"submit_cmd": "false"}),
    ));
    let err = backend.run(&unit).expect_err("submit fails");
    assert_eq!(err.info().code, "backend.submit");
}

#[test]
fn dry_run_counts_launches() {
    let dir = tempdir().expect("tempdir");
    let mut backend = DryRunBackend::new(dir.path());
    let first = backend
        .run(&FakeUnit::new(dir.path(), "a", "./app"))
        .expect("first");
    let second = backend
        .run(&FakeUnit::new(dir.path(), "b", "./app"))
        .expect("second");
    assert_eq!(first, "dry-run-0");
    assert_eq!(second, "dry-run-1");
    assert!(dir.path().join("b.job").is_file());
    assert!(!dir.path().join("out/b.out").exists());
}

#[test]
fn registry_resolves_aliases_and_rejects_unknown_hosts() {
    let dir = tempdir().expect("tempdir");
    let registry = BackendRegistry::with_defaults();
    let backend = registry
        .build(&host("LocalHost", dir.path(), json!({})))
        .expect("alias");
    assert_eq!(backend.name(), "local");
    let err = registry
        .build(&host("pbs", dir.path(), json!({})))
        .err()
        .expect("unknown host");
    assert_eq!(err.info().code, "config.unknown_backend");
}
