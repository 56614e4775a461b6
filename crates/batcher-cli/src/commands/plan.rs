use std::error::Error;

use batcher_exp::Dispatchable;
use batcher_host::{BackendRegistry, Dispatcher};
use clap::Args;

use super::{load_config, plan_batch, GlobalArgs, LaunchArgs};

#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,
}

/// Prints one line per unit: name, member count, wall time and marker.
pub fn run(global: &GlobalArgs, args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(global)?;
    let plan = plan_batch(global, &config, &args.launch)?;
    let backend = BackendRegistry::with_defaults().build_named("dry-run", &config.host)?;
    let mut dispatcher = Dispatcher::new(backend);
    for unit in &plan.units {
        dispatcher.dispatch(unit)?;
        println!(
            "{}\t{}\t{}\t{}",
            unit.name()?,
            unit.len(),
            unit.wall_time(),
            unit.marker()?.display()
        );
    }
    println!(
        "# {} units, {} jobs pending, {} already complete",
        plan.units.len(),
        plan.pending(),
        plan.skipped
    );
    Ok(())
}
