use std::collections::BTreeSet;
use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use batcher_exp::Job;
use batcher_results::{ResultAggregator, ShellStats};
use clap::Args;
use tracing::{info, warn};

use super::{load_config, load_experiments, GlobalArgs};

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Description files whose jobs are aggregated.
    #[arg(short = 'f', long = "files", num_args = 1.., required = true)]
    pub files: Vec<PathBuf>,
    /// Grouping parameters, outermost first.
    #[arg(long = "csv-params", num_args = 1..)]
    pub csv_params: Vec<String>,
    /// Stats to extract for every job.
    #[arg(long = "csv-stats", num_args = 1..)]
    pub csv_stats: Vec<String>,
    /// Write CSV here instead of stdout.
    #[arg(long = "csv-output")]
    pub csv_output: Option<PathBuf>,
}

struct Report<'a> {
    jobs: &'a [Job],
    params: &'a [String],
    stats: &'a [String],
    output: Option<&'a Path>,
}

/// Global descriptor overrides take precedence over command line values.
pub fn run(global: &GlobalArgs, args: &ResultsArgs) -> Result<(), Box<dyn Error>> {
    let config = load_config(global)?;
    let loaded = load_experiments(global, &config, &args.files)?;
    let reports: Vec<Report<'_>> = if loaded.descriptors.is_empty() {
        vec![Report {
            jobs: &loaded.jobs,
            params: &args.csv_params,
            stats: &args.csv_stats,
            output: args.csv_output.as_deref(),
        }]
    } else {
        loaded
            .descriptors
            .iter()
            .map(|desc| Report {
                jobs: &desc.jobs,
                params: desc.csv_params.as_deref().unwrap_or(&args.csv_params),
                stats: desc.csv_stats.as_deref().unwrap_or(&args.csv_stats),
                output: desc.csv_output.as_deref().or(args.csv_output.as_deref()),
            })
            .collect()
    };
    let aggregator = ResultAggregator::new(&ShellStats);
    let mut written: BTreeSet<PathBuf> = BTreeSet::new();
    for report in reports {
        let aggregation = aggregator.aggregate(report.jobs, report.params, report.stats)?;
        match report.output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                // Reports sharing a path are appended, not overwritten.
                let repeat = !written.insert(path.to_path_buf());
                if repeat {
                    warn!(path = %path.display(), "several reports share this output, appending");
                }
                let file = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .append(repeat)
                    .truncate(!repeat)
                    .open(path)?;
                aggregation.write_csv(BufWriter::new(file))?;
                info!(path = %path.display(), "wrote results");
            }
            None => aggregation.write_csv(io::stdout().lock())?,
        }
    }
    Ok(())
}
