use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    plan::{self, PlanArgs},
    results::{self, ResultsArgs},
    run::{self, RunArgs},
    GlobalArgs,
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "batcher",
    version,
    about = "Expand experiment descriptions into jobs, launch them and collect their results"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand, deduplicate, pack and launch jobs on the configured host.
    Run(RunArgs),
    /// Show what `run` would launch and write its scripts without running them.
    Plan(PlanArgs),
    /// Aggregate stats of finished jobs into CSV.
    Results(ResultsArgs),
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose, cli.global.quiet);
    match cli.command {
        Command::Run(args) => run::run(&cli.global, &args),
        Command::Plan(args) => plan::run(&cli.global, &args),
        Command::Results(args) => results::run(&cli.global, &args),
    }
}
