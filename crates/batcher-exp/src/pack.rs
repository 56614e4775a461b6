//! Grouping of jobs into packs that run sequentially inside one allocation.
//!
//! Jobs are first partitioned by the values of the `pack_params` (groups keep
//! first-seen order), then each partition is cut into chunks of `pack_size`.
//! Without a `pack_size` a partition becomes a single pack. Without either
//! setting every job is dispatched on its own.

use std::fmt::Display;
use std::path::PathBuf;

use batcher_core::errors::{BatcherError, ErrorInfo};
use batcher_core::ParamValue;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dispatch::{DispatchUnit, Dispatchable};
use crate::job::Job;

/// Directory under the first member's out_dir holding pack markers.
pub const PACKS_DIR: &str = "packs";

/// Packing options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackPlan {
    #[serde(default)]
    pub pack_params: Vec<String>,
    #[serde(default)]
    pub pack_size: Option<usize>,
}

impl PackPlan {
    pub fn validate(&self) -> Result<(), BatcherError> {
        if self.pack_size == Some(0) {
            return Err(BatcherError::Pack(
                ErrorInfo::new("pack.invalid_size", "pack size must be positive")
                    .with_hint("omit --pack-size to pack whole partitions"),
            ));
        }
        Ok(())
    }

    /// True when no packing was requested.
    pub fn is_disabled(&self) -> bool {
        self.pack_params.is_empty() && self.pack_size.is_none()
    }
}

/// Splits `jobs` into groups sharing the values of every name in `params`.
pub fn partition(jobs: Vec<Job>, params: &[String]) -> Result<Vec<Vec<Job>>, BatcherError> {
    let Some((first, rest)) = params.split_first() else {
        return Ok(vec![jobs]);
    };
    let mut groups: Vec<(ParamValue, Vec<Job>)> = Vec::new();
    for job in jobs {
        let key = job.param(first)?.clone();
        match groups.iter_mut().find(|(value, _)| *value == key) {
            Some((_, members)) => members.push(job),
            None => groups.push((key, vec![job])),
        }
    }
    let mut out = Vec::new();
    for (_, members) in groups {
        out.extend(partition(members, rest)?);
    }
    Ok(out)
}

fn chunk(jobs: Vec<Job>, size: usize) -> Vec<Vec<Job>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(size);
    for job in jobs {
        current.push(job);
        if current.len() == size {
            out.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Turns jobs into dispatch units according to `plan`.
///
/// Every input job appears in exactly one unit. Pack ids count from zero in
/// output order.
pub fn pack(jobs: Vec<Job>, plan: &PackPlan) -> Result<Vec<DispatchUnit>, BatcherError> {
    plan.validate()?;
    if plan.is_disabled() {
        return Ok(jobs.into_iter().map(DispatchUnit::Single).collect());
    }
    let mut groups = Vec::new();
    for part in partition(jobs, &plan.pack_params)? {
        match plan.pack_size {
            Some(size) => groups.extend(chunk(part, size)),
            None => groups.push(part),
        }
    }
    groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .enumerate()
        .map(|(id, members)| {
            debug!(pack_id = id, size = members.len(), "built pack");
            PackedJob::new(id, members).map(DispatchUnit::Pack)
        })
        .collect()
}

/// Several jobs launched together as one unit.
///
/// Fields that must be shared (pack name, packed parameter values) are checked
/// when they are read; disagreement between members is an error naming both
/// values.
#[derive(Debug, Clone)]
pub struct PackedJob {
    id: usize,
    members: Vec<Job>,
}

impl PackedJob {
    pub fn new(id: usize, members: Vec<Job>) -> Result<Self, BatcherError> {
        if members.is_empty() {
            return Err(BatcherError::Pack(
                ErrorInfo::new("pack.empty", "a pack needs at least one member")
                    .with_context("pack_id", id.to_string()),
            ));
        }
        Ok(Self { id, members })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn members(&self) -> &[Job] {
        &self.members
    }

    fn first(&self) -> &Job {
        &self.members[0]
    }

    fn shared<T, F>(&self, field: &str, read: F) -> Result<T, BatcherError>
    where
        T: PartialEq + Display,
        F: Fn(&Job) -> Result<T, BatcherError>,
    {
        let expected = read(self.first())?;
        for member in &self.members[1..] {
            let actual = read(member)?;
            if actual != expected {
                return Err(BatcherError::Pack(
                    ErrorInfo::new(
                        "pack.mismatch",
                        format!("expected {field} {expected}, saw {actual}"),
                    )
                    .with_context("field", field)
                    .with_context("expected", expected.to_string())
                    .with_context("actual", actual.to_string())
                    .with_context("pack_id", self.id.to_string()),
                ));
            }
        }
        Ok(expected)
    }
}

impl Dispatchable for PackedJob {
    fn name(&self) -> Result<String, BatcherError> {
        let base = self.shared("pack_name", Job::pack_name)?;
        Ok(format!("{base}_{}", self.id))
    }

    /// Member commands run one after another, each from its own app_dir with
    /// output sent to its own marker.
    fn cmd_line(&self) -> Result<String, BatcherError> {
        let mut script = String::new();
        for member in &self.members {
            let env = member.env()?;
            if !env.is_empty() {
                script.push_str(&env);
                script.push('\n');
            }
            let app_dir = member.app_dir()?;
            if !app_dir.is_empty() {
                script.push_str(&format!("cd {app_dir}\n"));
            }
            script.push_str(&format!(
                "{} > {} 2>&1\n",
                member.cmd_line()?,
                member.stdout_path()?.display()
            ));
        }
        Ok(script)
    }

    fn env(&self) -> Result<String, BatcherError> {
        Ok(String::new())
    }

    fn app_dir(&self) -> Result<String, BatcherError> {
        Ok(String::new())
    }

    fn wall_time(&self) -> String {
        self.first().wall_time()
    }

    fn marker(&self) -> Result<PathBuf, BatcherError> {
        Ok(self
            .first()
            .module()
            .out_dir
            .join(PACKS_DIR)
            .join(format!("{}.out", self.name()?)))
    }

    fn param(&self, name: &str) -> Result<ParamValue, BatcherError> {
        self.shared(name, |job| job.param(name).cloned())
    }
}
