use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::template::render_sample;
use batcher_core::{ModuleConfig, ParamValue, ParameterSample};

use crate::dispatch::Dispatchable;
use crate::spec::{ExperimentSpec, DEFAULT_WALL_TIME};

/// One concrete run: an experiment bound to a parameter sample.
///
/// Every textual field is derived on demand by rendering the experiment's
/// templates against the sample.
#[derive(Debug, Clone)]
pub struct Job {
    spec: Arc<ExperimentSpec>,
    sample: ParameterSample,
    id: usize,
    module: Arc<ModuleConfig>,
}

impl Job {
    pub fn new(
        spec: Arc<ExperimentSpec>,
        sample: ParameterSample,
        id: usize,
        module: Arc<ModuleConfig>,
    ) -> Self {
        Self {
            spec,
            sample,
            id,
            module,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn spec(&self) -> &ExperimentSpec {
        &self.spec
    }

    pub fn sample(&self) -> &ParameterSample {
        &self.sample
    }

    pub fn module(&self) -> &ModuleConfig {
        &self.module
    }

    fn render(&self, template: &str) -> Result<String, BatcherError> {
        render_sample(template, &self.sample)
    }

    /// Rendered job name with spaces replaced by underscores.
    pub fn name(&self) -> Result<String, BatcherError> {
        Ok(self.render(&self.spec.name)?.replace(' ', "_"))
    }

    pub fn cmd_line(&self) -> Result<String, BatcherError> {
        self.render(&self.spec.bin)
    }

    pub fn env(&self) -> Result<String, BatcherError> {
        self.render(&self.spec.env)
    }

    pub fn app_dir(&self) -> Result<String, BatcherError> {
        self.render(&self.spec.app_dir)
    }

    pub fn graph_name(&self) -> Result<String, BatcherError> {
        self.render(&self.spec.graph_name)
    }

    pub fn pack_name(&self) -> Result<String, BatcherError> {
        self.render(&self.spec.pack_name)
    }

    pub fn wall_time(&self) -> String {
        self.spec
            .wall_time
            .clone()
            .unwrap_or_else(|| DEFAULT_WALL_TIME.to_string())
    }

    /// `<out_dir>/<rendered working_dir>`.
    pub fn working_dir(&self) -> Result<PathBuf, BatcherError> {
        Ok(self.module.out_dir.join(self.render(&self.spec.working_dir)?))
    }

    /// Stdout file, doubling as the completion marker.
    pub fn stdout_path(&self) -> Result<PathBuf, BatcherError> {
        Ok(self.working_dir()?.join(format!("{}.out", self.name()?)))
    }

    /// Value bound to `name` in this job's sample.
    pub fn param(&self, name: &str) -> Result<&ParamValue, BatcherError> {
        self.sample.get(name).ok_or_else(|| {
            BatcherError::Template(
                ErrorInfo::new("template.missing_param", "job has no such parameter")
                    .with_context("param", name)
                    .with_context("job_id", self.id.to_string()),
            )
        })
    }

    /// Creates the working directory so the marker can be written.
    pub fn prepare(&self) -> Result<(), BatcherError> {
        let dir = self.working_dir()?;
        fs::create_dir_all(&dir).map_err(|err| BatcherError::io("job.prepare", &dir, err))
    }
}

impl Dispatchable for Job {
    fn name(&self) -> Result<String, BatcherError> {
        Job::name(self)
    }

    fn cmd_line(&self) -> Result<String, BatcherError> {
        Job::cmd_line(self)
    }

    fn env(&self) -> Result<String, BatcherError> {
        Job::env(self)
    }

    fn app_dir(&self) -> Result<String, BatcherError> {
        Job::app_dir(self)
    }

    fn wall_time(&self) -> String {
        Job::wall_time(self)
    }

    fn marker(&self) -> Result<PathBuf, BatcherError> {
        self.stdout_path()
    }

    fn param(&self, name: &str) -> Result<ParamValue, BatcherError> {
        Job::param(self, name).cloned()
    }
}
