use std::fs;
use std::path::{Path, PathBuf};

use batcher_core::{BatcherConfig, ParamValue};
use batcher_exp::{ExperimentLoader, LoadOptions, ModuleRegistry};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir");
    }
    fs::write(&path, body).expect("write fixture");
    path
}

fn config(out_dir: &Path) -> BatcherConfig {
    BatcherConfig::from_yaml_str(&format!(
        "modules:\n  binary:\n    out_dir: {}\n  replicas:\n    out_dir: {}\n    replicas: 2\n",
        out_dir.display(),
        out_dir.display()
    ))
    .expect("config")
}

const LEAF: &str = r#"{
    # sweep over two sizes
    "name": "leaf_{n}_{mode}",
    "working_dir": "runs/{mode}",
    "bin": "./sim {n} {mode}",
    "params": {"n": [1, 2], "mode": ["a", "b"]}
}"#;

#[test]
fn leaf_expands_in_odometer_order_with_sequential_ids() {
    let dir = tempdir().expect("tempdir");
    let leaf = write(dir.path(), "leaf.json", LEAF);
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let loaded = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[leaf])
        .expect("load");
    let names: Vec<String> = loaded.jobs.iter().map(|j| j.name().expect("name")).collect();
    assert_eq!(names, vec!["leaf_1_a", "leaf_1_b", "leaf_2_a", "leaf_2_b"]);
    let ids: Vec<usize> = loaded.jobs.iter().map(|j| j.id()).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert!(loaded.descriptors.is_empty());
    assert_eq!(
        loaded.jobs[0].stdout_path().expect("marker"),
        dir.path().join("runs/a/leaf_1_a.out")
    );
}

#[test]
fn global_descriptors_nest_and_resolve_globs() {
    let dir = tempdir().expect("tempdir");
    write(dir.path(), "sub/one.json", LEAF);
    write(
        dir.path(),
        "sub/two.json",
        r#"{"name": "two", "bin": "run", "model": "replicas"}"#,
    );
    write(
        dir.path(),
        "inner.json",
        r#"{"sim_files": ["sub/*.json"], "csv_stats": ["ipc"], "csv_output": "out.csv"}"#,
    );
    let outer = write(dir.path(), "outer.json", r#"{"sim_files": ["inner.json"]}"#);
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let loaded = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[outer.clone()])
        .expect("load");

    assert_eq!(loaded.jobs.len(), 6);
    assert_eq!(loaded.descriptors.len(), 2);
    let inner = &loaded.descriptors[0];
    assert_eq!(inner.csv_stats, Some(vec!["ipc".to_string()]));
    assert_eq!(inner.csv_output, Some(dir.path().join("out.csv")));
    assert_eq!(inner.jobs.len(), 6);
    assert_eq!(loaded.descriptors[1].path, outer);
    let replica = loaded.jobs[5].param("replica").expect("replica param");
    assert_eq!(replica, &ParamValue::Int(1));
}

#[test]
fn self_inclusion_is_a_cycle() {
    let dir = tempdir().expect("tempdir");
    write(dir.path(), "a.json", r#"{"sim_files": ["b.json"]}"#);
    let b = write(dir.path(), "b.json", r#"{"sim_files": ["a.json"]}"#);
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let err = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[b])
        .expect_err("cycle");
    assert_eq!(err.info().code, "spec.cycle");
}

#[test]
fn empty_glob_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let global = write(dir.path(), "g.json", r#"{"sim_files": ["none/*.json"]}"#);
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let err = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[global])
        .expect_err("empty glob");
    assert_eq!(err.info().code, "spec.glob_empty");
}

#[test]
fn prefix_and_model_override_apply_to_every_experiment() {
    let dir = tempdir().expect("tempdir");
    let leaf = write(dir.path(), "leaf.json", r#"{"name": "x", "bin": "run"}"#);
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let options = LoadOptions {
        name_prefix: Some("try1_".to_string()),
        model_override: Some("replicas".to_string()),
    };
    let loaded = ExperimentLoader::new(&config, &modules, options)
        .load(&[leaf])
        .expect("load");
    let names: Vec<String> = loaded.jobs.iter().map(|j| j.name().expect("name")).collect();
    assert_eq!(names, vec!["try1_x", "try1_x"]);
    assert_eq!(loaded.jobs[1].pack_name().expect("pack name"), "try1_x");
}

#[test]
fn unknown_module_is_a_config_error() {
    let dir = tempdir().expect("tempdir");
    let leaf = write(
        dir.path(),
        "leaf.json",
        r#"{"name": "x", "bin": "run", "model": "gem5"}"#,
    );
    let config = config(dir.path());
    let modules = ModuleRegistry::with_defaults();
    let err = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[leaf])
        .expect_err("unknown module");
    assert_eq!(err.info().code, "config.unknown_module");
}
