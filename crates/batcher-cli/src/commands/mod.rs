pub mod plan;
pub mod results;
pub mod run;

use std::error::Error;
use std::path::{Path, PathBuf};

use batcher_core::BatcherConfig;
use batcher_exp::{
    BatchPlan, BatchPlanner, ExperimentLoader, LoadOptions, LoadedExperiments, ModuleRegistry,
    PackPlan,
};
use clap::{ArgAction, Args};
use tracing::debug;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "config.json";

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Run configuration (YAML or JSON) with host and module settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Job module used for every description, overriding their `model`.
    #[arg(short = 'm', long = "use-model", global = true)]
    pub use_model: Option<String>,
    /// Prefix prepended to every experiment name.
    #[arg(short = 'n', long, global = true)]
    pub prefix: Option<String>,
    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Description files plus packing options shared by `run` and `plan`.
#[derive(Args, Debug)]
pub struct LaunchArgs {
    /// Description files to expand.
    #[arg(short = 'f', long = "files", num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,
    /// Parameters whose values must be shared inside a pack.
    #[arg(long = "pack-params", num_args = 1..)]
    pub pack_params: Vec<String>,
    /// Maximum number of jobs per pack.
    #[arg(long = "pack-size")]
    pub pack_size: Option<usize>,
    /// Seed for the launch order shuffle.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Loads the configuration, falling back to defaults when the implicit
/// `config.json` does not exist.
pub fn load_config(global: &GlobalArgs) -> Result<BatcherConfig, Box<dyn Error>> {
    match &global.config {
        Some(path) => Ok(BatcherConfig::load(path)?),
        None if Path::new(DEFAULT_CONFIG).is_file() => {
            Ok(BatcherConfig::load(Path::new(DEFAULT_CONFIG))?)
        }
        None => {
            debug!("no {DEFAULT_CONFIG} found, using default configuration");
            Ok(BatcherConfig::default())
        }
    }
}

pub fn load_experiments(
    global: &GlobalArgs,
    config: &BatcherConfig,
    files: &[PathBuf],
) -> Result<LoadedExperiments, Box<dyn Error>> {
    let modules = ModuleRegistry::with_defaults();
    let options = LoadOptions {
        name_prefix: global.prefix.clone(),
        model_override: global.use_model.clone(),
    };
    Ok(ExperimentLoader::new(config, &modules, options).load(files)?)
}

/// Loads the descriptions and runs them through the batch planner.
pub fn plan_batch(
    global: &GlobalArgs,
    config: &BatcherConfig,
    args: &LaunchArgs,
) -> Result<BatchPlan, Box<dyn Error>> {
    let loaded = load_experiments(global, config, &args.files)?;
    let planner = BatchPlanner {
        pack: PackPlan {
            pack_params: args.pack_params.clone(),
            pack_size: args.pack_size,
        },
        seed: args.seed,
    };
    Ok(planner.plan(loaded.jobs)?)
}
