//! Job modules: named strategies turning one parameter sample into jobs.

use std::collections::BTreeMap;
use std::sync::Arc;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::{ModuleConfig, ParamValue, ParameterSample};

use crate::job::Job;
use crate::spec::ExperimentSpec;

/// Module used when neither the experiment nor the CLI names one.
pub const DEFAULT_MODULE: &str = "binary";

/// Parameter added by the `replicas` module.
pub const REPLICA_PARAM: &str = "replica";

/// Builds the jobs for one sample.
///
/// `first_id` is the id of the first produced job; implementations number
/// their jobs consecutively from it.
pub trait JobFactory: Send + Sync {
    fn build(
        &self,
        spec: &Arc<ExperimentSpec>,
        sample: ParameterSample,
        first_id: usize,
        module: &Arc<ModuleConfig>,
    ) -> Result<Vec<Job>, BatcherError>;
}

/// One job per sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryFactory;

impl JobFactory for BinaryFactory {
    fn build(
        &self,
        spec: &Arc<ExperimentSpec>,
        sample: ParameterSample,
        first_id: usize,
        module: &Arc<ModuleConfig>,
    ) -> Result<Vec<Job>, BatcherError> {
        Ok(vec![Job::new(spec.clone(), sample, first_id, module.clone())])
    }
}

/// `replicas` copies of each sample, told apart by a `replica` parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicaFactory;

impl JobFactory for ReplicaFactory {
    fn build(
        &self,
        spec: &Arc<ExperimentSpec>,
        sample: ParameterSample,
        first_id: usize,
        module: &Arc<ModuleConfig>,
    ) -> Result<Vec<Job>, BatcherError> {
        let replicas = module.option_u64("replicas").unwrap_or(1);
        if replicas == 0 {
            return Err(BatcherError::Config(
                ErrorInfo::new("config.invalid_option", "replicas must be positive")
                    .with_context("option", "replicas"),
            ));
        }
        Ok((0..replicas)
            .map(|replica| {
                let sample = sample.with(REPLICA_PARAM, ParamValue::Int(replica as i64));
                Job::new(
                    spec.clone(),
                    sample,
                    first_id + replica as usize,
                    module.clone(),
                )
            })
            .collect())
    }
}

/// Module name to factory lookup.
pub struct ModuleRegistry {
    factories: BTreeMap<String, Box<dyn JobFactory>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry holding `binary` and `replicas`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_MODULE, BinaryFactory);
        registry.register("replicas", ReplicaFactory);
        registry
    }

    pub fn register<F: JobFactory + 'static>(&mut self, name: impl Into<String>, factory: F) {
        self.factories.insert(name.into(), Box::new(factory));
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn JobFactory, BatcherError> {
        self.factories
            .get(name)
            .map(|factory| factory.as_ref())
            .ok_or_else(|| {
                BatcherError::Config(
                    ErrorInfo::new("config.unknown_module", "no job module with this name")
                        .with_context("module", name)
                        .with_hint(format!("known modules: {}", self.names().join(", "))),
                )
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
