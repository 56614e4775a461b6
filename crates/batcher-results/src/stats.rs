//! Stat extraction from finished jobs.

use std::fmt;
use std::process::Command;

use batcher_core::template::render;
use batcher_core::{format_float, BatcherError};
use batcher_exp::Job;
use tracing::{debug, warn};

/// Value recorded when a stat command fails.
pub const FALLBACK_VALUE: f64 = 0.0;

/// Rendering of [`StatValue::Missing`] in reports.
pub const MISSING: &str = "None";

/// One extracted stat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Value(f64),
    Missing,
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Value(value) => f.write_str(&format_float(*value)),
            StatValue::Missing => f.write_str(MISSING),
        }
    }
}

/// Source of per-job stat values.
///
/// Extraction never fails; problems are folded into the returned value.
pub trait StatsProvider {
    fn get_stat(&self, job: &Job, stat: &str) -> StatValue;
}

/// Runs the shell command configured under the job module's `stats`.
///
/// Commands may use `{stdout}`, `{working_dir}`, `{app_dir}` and `{name}` as
/// well as any of the job's parameters. Numeric output lines are averaged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellStats;

impl ShellStats {
    /// Renders the configured command for `stat`, if there is one.
    pub fn command(&self, job: &Job, stat: &str) -> Option<Result<String, BatcherError>> {
        let template = job.module().stats.get(stat)?;
        Some(render(template, |name| match name {
            "stdout" => job.stdout_path().ok().map(|p| p.display().to_string()),
            "working_dir" => job.working_dir().ok().map(|p| p.display().to_string()),
            "app_dir" => job.app_dir().ok(),
            "name" => job.name().ok(),
            other => job.sample().get(other).map(ToString::to_string),
        }))
    }
}

/// Averages the numeric lines of `output`.
pub fn parse_output(output: &str) -> StatValue {
    let values: Vec<f64> = output
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .collect();
    if values.is_empty() {
        StatValue::Missing
    } else {
        StatValue::Value(values.iter().sum::<f64>() / values.len() as f64)
    }
}

impl StatsProvider for ShellStats {
    fn get_stat(&self, job: &Job, stat: &str) -> StatValue {
        let cmd = match self.command(job, stat) {
            None => {
                debug!(stat, "no command configured for stat");
                return StatValue::Missing;
            }
            Some(Err(err)) => {
                warn!(stat, error = %err, "could not render stat command");
                return StatValue::Value(FALLBACK_VALUE);
            }
            Some(Ok(cmd)) => cmd,
        };
        match Command::new("sh").arg("-c").arg(&cmd).output() {
            Ok(output) if output.status.success() => {
                parse_output(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(stat, cmd = %cmd, status = %output.status, "stat command failed");
                StatValue::Value(FALLBACK_VALUE)
            }
            Err(err) => {
                warn!(stat, cmd = %cmd, error = %err, "stat command could not start");
                StatValue::Value(FALLBACK_VALUE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_lines_are_averaged() {
        assert_eq!(parse_output("1\n2\nfoo\n"), StatValue::Value(1.5));
        assert_eq!(parse_output("n/a\n"), StatValue::Missing);
        assert_eq!(parse_output(""), StatValue::Missing);
    }

    #[test]
    fn values_render_with_a_decimal() {
        assert_eq!(StatValue::Value(3.0).to_string(), "3.0");
        assert_eq!(StatValue::Missing.to_string(), "None");
    }
}
