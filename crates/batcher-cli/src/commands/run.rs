use std::error::Error;

use batcher_host::{BackendRegistry, Dispatcher};
use clap::Args;
use tracing::info;

use super::{load_config, plan_batch, GlobalArgs, LaunchArgs};

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub launch: LaunchArgs,
}

pub fn run(global: &GlobalArgs, args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(global)?;
    let plan = plan_batch(global, &config, &args.launch)?;
    let backend = BackendRegistry::with_defaults().build(&config.host)?;
    let mut dispatcher = Dispatcher::new(backend);
    let records = dispatcher.dispatch_all(&plan.units)?;
    for record in &records {
        println!("{}\t{}", record.name, record.backend_id);
    }
    info!(
        launched = records.len(),
        skipped = plan.skipped,
        backend = dispatcher.backend_name(),
        "run complete"
    );
    Ok(())
}
