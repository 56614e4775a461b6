//! Execution backends for batcher dispatch units.
//!
//! Backends are looked up by name in a [`BackendRegistry`] built at startup;
//! the configured host type selects one. The [`Dispatcher`] feeds it the
//! planner's units.

mod backend;
mod dispatcher;
mod dry_run;
mod local;
mod registry;
mod script;
mod slurm;

pub use backend::ExecutionBackend;
pub use dispatcher::{Dispatcher, LaunchRecord};
pub use dry_run::DryRunBackend;
pub use local::LocalBackend;
pub use registry::{BackendCtor, BackendRegistry};
pub use script::{render_body, render_local, script_path, write_script};
pub use slurm::SlurmBackend;
