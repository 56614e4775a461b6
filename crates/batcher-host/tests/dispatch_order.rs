use std::sync::Arc;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::{ModuleConfig, ParamValue, ParameterSample};
use batcher_exp::{DispatchUnit, Dispatchable, ExperimentSpec, Job};
use batcher_host::{Dispatcher, ExecutionBackend};
use serde_json::json;

struct FailOn {
    fail_name: String,
    seen: usize,
}

impl ExecutionBackend for FailOn {
    fn name(&self) -> &str {
        "fail-on"
    }

    fn run(&mut self, unit: &dyn Dispatchable) -> Result<String, BatcherError> {
        let name = unit.name()?;
        if name == self.fail_name {
            return Err(BatcherError::Backend(ErrorInfo::new(
                "backend.submit",
                "refused",
            )));
        }
        self.seen += 1;
        Ok(format!("id-{}", self.seen))
    }
}

fn units(count: i64) -> Vec<DispatchUnit> {
    let spec = Arc::new(
        ExperimentSpec::from_json(json!({"name": "job{n}", "bin": "run"})).expect("spec"),
    );
    let module = Arc::new(ModuleConfig::default());
    (0..count)
        .map(|n| {
            let sample: ParameterSample = [("n", ParamValue::Int(n))].into_iter().collect();
            DispatchUnit::Single(Job::new(spec.clone(), sample, n as usize, module.clone()))
        })
        .collect()
}

#[test]
fn records_every_launch_in_order() {
    let mut dispatcher = Dispatcher::new(Box::new(FailOn {
        fail_name: "none".into(),
        seen: 0,
    }));
    let records = dispatcher.dispatch_all(&units(3)).expect("dispatch");
    let ids: Vec<&str> = records.iter().map(|r| r.backend_id.as_str()).collect();
    assert_eq!(ids, vec!["id-1", "id-2", "id-3"]);
    assert_eq!(records[2].name, "job2");
}

#[test]
fn stops_at_first_backend_error() {
    let mut dispatcher = Dispatcher::new(Box::new(FailOn {
        fail_name: "job1".into(),
        seen: 0,
    }));
    let err = dispatcher.dispatch_all(&units(3)).expect_err("fails");
    assert_eq!(err.info().code, "backend.submit");
    assert_eq!(dispatcher.backend_name(), "fail-on");
}
