use std::sync::Arc;

use batcher_core::ModuleConfig;
use batcher_exp::{pack, sample, ExperimentSpec, Job, PackPlan};
use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::json;

fn make_spec() -> ExperimentSpec {
    ExperimentSpec::from_json(json!({
        "name": "bench_{nodes}_{size}_{mode}",
        "working_dir": "runs/{mode}",
        "bin": "./app --size {size} --nodes {nodes}",
        "pack_name": "pack_{nodes}",
        "params": {
            "nodes": "expr: range(1, 9)",
            "size": "expr: range(16, 4096, 64)",
            "mode": ["fast", "slow", "mixed"]
        }
    }))
    .expect("spec")
}

fn bench_expand(c: &mut Criterion) {
    let spec = Arc::new(make_spec());
    let module = Arc::new(ModuleConfig::default());
    c.bench_function("expand_grid", |b| {
        b.iter(|| {
            let jobs: Vec<Job> = sample(&spec.params)
                .enumerate()
                .map(|(id, s)| Job::new(spec.clone(), s, id, module.clone()))
                .collect();
            jobs.len()
        });
    });
    let plan = PackPlan {
        pack_params: vec!["nodes".to_string()],
        pack_size: Some(16),
    };
    c.bench_function("pack_by_nodes", |b| {
        b.iter(|| {
            let jobs: Vec<Job> = sample(&spec.params)
                .enumerate()
                .map(|(id, s)| Job::new(spec.clone(), s, id, module.clone()))
                .collect();
            pack(jobs, &plan).expect("pack").len()
        });
    });
}

criterion_group!(benches, bench_expand);
criterion_main!(benches);
