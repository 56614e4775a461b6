//! Experiment expansion and batch planning.
//!
//! Description files are loaded into [`Job`]s by [`ExperimentLoader`], which
//! samples each experiment's parameter grid and hands every sample to a job
//! module. [`BatchPlanner`] then shuffles, prepares, deduplicates and packs
//! the jobs into [`DispatchUnit`]s for an execution backend.

mod batch;
mod dedup;
mod dispatch;
mod document;
mod factory;
mod job;
mod loader;
mod pack;
mod sampler;
mod spec;

pub use batch::{BatchPlan, BatchPlanner};
pub use dedup::{is_completed, remove_completed};
pub use dispatch::{DispatchUnit, Dispatchable};
pub use document::{read_description, strip_comments};
pub use factory::{
    BinaryFactory, JobFactory, ModuleRegistry, ReplicaFactory, DEFAULT_MODULE, REPLICA_PARAM,
};
pub use job::Job;
pub use loader::{ExperimentLoader, GlobalDescriptor, LoadOptions, LoadedExperiments};
pub use pack::{pack, partition, PackPlan, PackedJob, PACKS_DIR};
pub use sampler::{cardinality, sample, GridSampler};
pub use spec::{
    normalize_candidates, Description, ExperimentSpec, GlobalDescription, Parameter,
    DEFAULT_PACK_NAME, DEFAULT_WALL_TIME, SUB_FILES_FIELD,
};
