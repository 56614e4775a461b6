use std::fs;
use std::path::Path;

use batcher_core::BatcherConfig;
use batcher_exp::{
    pack, BatchPlanner, Dispatchable, ExperimentLoader, Job, LoadOptions, ModuleRegistry,
    PackPlan,
};
use tempfile::tempdir;

fn load(dir: &Path) -> Vec<Job> {
    let leaf = dir.join("leaf.json");
    fs::write(
        &leaf,
        r#"{
            "name": "job_{nodes}_{size}",
            "working_dir": "w",
            "pack_name": "pack_n{nodes}",
            "bin": "./app {size}",
            "wall_time": "00:10:00",
            "params": {"nodes": [1, 2], "size": [10, 20, 30]}
        }"#,
    )
    .expect("write leaf");
    let config = BatcherConfig::from_yaml_str(&format!(
        "modules:\n  binary:\n    out_dir: {}\n",
        dir.display()
    ))
    .expect("config");
    let modules = ModuleRegistry::with_defaults();
    ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[leaf])
        .expect("load")
        .jobs
}

#[test]
fn completed_jobs_are_skipped_before_packing() {
    let dir = tempdir().expect("tempdir");
    let jobs = load(dir.path());
    fs::create_dir_all(dir.path().join("w")).expect("w");
    fs::write(dir.path().join("w/job_1_10.out"), "done").expect("marker");

    let planner = BatchPlanner {
        pack: PackPlan {
            pack_params: vec!["nodes".to_string()],
            pack_size: None,
        },
        seed: Some(7),
    };
    let plan = planner.plan(jobs).expect("plan");
    assert_eq!(plan.total, 6);
    assert_eq!(plan.skipped, 1);
    assert_eq!(plan.pending(), 5);
    assert_eq!(plan.units.len(), 2);
    let members: usize = plan.units.iter().map(|u| u.len()).sum();
    assert_eq!(members, 5);
    for unit in &plan.units {
        let nodes = unit.param("nodes").expect("shared nodes");
        assert!(unit.name().expect("name").starts_with(&format!("pack_n{nodes}_")));
        assert_eq!(unit.wall_time(), "00:10:00");
    }
}

#[test]
fn same_seed_gives_same_order() {
    let dir = tempdir().expect("tempdir");
    let planner = BatchPlanner {
        pack: PackPlan::default(),
        seed: Some(99),
    };
    let first: Vec<usize> = planner
        .plan(load(dir.path()))
        .expect("plan")
        .units
        .iter()
        .map(|u| u.jobs()[0].id())
        .collect();
    let second: Vec<usize> = planner
        .plan(load(dir.path()))
        .expect("plan")
        .units
        .iter()
        .map(|u| u.jobs()[0].id())
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);
}

#[test]
fn prepare_creates_working_dirs() {
    let dir = tempdir().expect("tempdir");
    let jobs = load(dir.path());
    BatchPlanner::default().plan(jobs).expect("plan");
    assert!(dir.path().join("w").is_dir());
}

#[test]
fn chunked_packs_respect_size() {
    let dir = tempdir().expect("tempdir");
    let planner = BatchPlanner {
        pack: PackPlan {
            pack_params: vec!["nodes".to_string()],
            pack_size: Some(2),
        },
        seed: Some(1),
    };
    let plan = planner.plan(load(dir.path())).expect("plan");
    let mut sizes: Vec<usize> = plan.units.iter().map(|u| u.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 1, 2, 2]);
    assert!(plan.units.iter().all(|u| u.is_pack()));
}

#[test]
fn packs_share_a_name_without_explicit_pack_name() {
    let dir = tempdir().expect("tempdir");
    let leaf = dir.path().join("double.json");
    fs::write(
        &leaf,
        r#"{
            "name": "double_{n}_{mode}",
            "bin": "echo {n}",
            "params": {"n": [1, 2], "mode": ["a", "b"]}
        }"#,
    )
    .expect("write leaf");
    let config = BatcherConfig::from_yaml_str(&format!(
        "modules:\n  binary:\n    out_dir: {}\n",
        dir.path().display()
    ))
    .expect("config");
    let modules = ModuleRegistry::with_defaults();
    let jobs = ExperimentLoader::new(&config, &modules, LoadOptions::default())
        .load(&[leaf])
        .expect("load")
        .jobs;
    let plan = PackPlan {
        pack_params: vec!["mode".to_string()],
        pack_size: None,
    };
    let units = pack(jobs, &plan).expect("pack");
    assert_eq!(units.len(), 2);

    let members: Vec<Vec<String>> = units
        .iter()
        .map(|u| u.jobs().iter().map(|j| j.name().expect("name")).collect())
        .collect();
    assert_eq!(
        members,
        vec![
            vec!["double_1_a".to_string(), "double_2_a".to_string()],
            vec!["double_1_b".to_string(), "double_2_b".to_string()],
        ]
    );
    assert_eq!(units[0].name().expect("pack name"), "double_0");
    assert_eq!(units[1].name().expect("pack name"), "double_1");
    assert_eq!(units[1].param("mode").expect("mode").to_string(), "b");
}
