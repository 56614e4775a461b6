use std::path::PathBuf;

use batcher_core::{BatcherError, ParamValue};

use crate::job::Job;
use crate::pack::PackedJob;

/// Launchable unit as seen by execution backends.
///
/// Both single jobs and packs implement this; backends never need to know
/// which one they were handed.
pub trait Dispatchable {
    fn name(&self) -> Result<String, BatcherError>;
    fn cmd_line(&self) -> Result<String, BatcherError>;
    fn env(&self) -> Result<String, BatcherError>;
    fn app_dir(&self) -> Result<String, BatcherError>;
    fn wall_time(&self) -> String;
    /// Completion marker; it also receives the unit's stdout.
    fn marker(&self) -> Result<PathBuf, BatcherError>;
    fn param(&self, name: &str) -> Result<ParamValue, BatcherError>;
}

/// What the planner hands to the dispatcher.
#[derive(Debug, Clone)]
pub enum DispatchUnit {
    Single(Job),
    Pack(PackedJob),
}

impl DispatchUnit {
    /// Jobs carried by this unit.
    pub fn jobs(&self) -> &[Job] {
        match self {
            DispatchUnit::Single(job) => std::slice::from_ref(job),
            DispatchUnit::Pack(pack) => pack.members(),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs().is_empty()
    }

    pub fn is_pack(&self) -> bool {
        matches!(self, DispatchUnit::Pack(_))
    }

    fn inner(&self) -> &dyn Dispatchable {
        match self {
            DispatchUnit::Single(job) => job as &dyn Dispatchable,
            DispatchUnit::Pack(pack) => pack,
        }
    }
}

impl Dispatchable for DispatchUnit {
    fn name(&self) -> Result<String, BatcherError> {
        self.inner().name()
    }

    fn cmd_line(&self) -> Result<String, BatcherError> {
        self.inner().cmd_line()
    }

    fn env(&self) -> Result<String, BatcherError> {
        self.inner().env()
    }

    fn app_dir(&self) -> Result<String, BatcherError> {
        self.inner().app_dir()
    }

    fn wall_time(&self) -> String {
        self.inner().wall_time()
    }

    fn marker(&self) -> Result<PathBuf, BatcherError> {
        self.inner().marker()
    }

    fn param(&self, name: &str) -> Result<ParamValue, BatcherError> {
        self.inner().param(name)
    }
}
