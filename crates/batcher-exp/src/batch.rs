use batcher_core::{BatcherError, RngHandle};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dedup::remove_completed;
use crate::dispatch::DispatchUnit;
use crate::job::Job;
use crate::pack::{pack, PackPlan};

/// Turns loaded jobs into the units to launch.
///
/// The stages run in a fixed order: shuffle, prepare, drop completed jobs,
/// pack. Packing after dedup means a pack only holds jobs that still need to
/// run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPlanner {
    #[serde(default)]
    pub pack: PackPlan,
    /// Seed for the launch-order shuffle; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Output of [`BatchPlanner::plan`].
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub units: Vec<DispatchUnit>,
    /// Jobs handed to the planner.
    pub total: usize,
    /// Jobs dropped because their marker already existed.
    pub skipped: usize,
}

impl BatchPlan {
    /// Jobs that will actually run.
    pub fn pending(&self) -> usize {
        self.total - self.skipped
    }
}

impl BatchPlanner {
    pub fn plan(&self, mut jobs: Vec<Job>) -> Result<BatchPlan, BatcherError> {
        self.pack.validate()?;
        let total = jobs.len();
        RngHandle::from_optional_seed(self.seed).shuffle(&mut jobs);
        for job in &jobs {
            job.prepare()?;
        }
        let jobs = remove_completed(jobs);
        let skipped = total - jobs.len();
        let units = pack(jobs, &self.pack)?;
        info!(total, skipped, units = units.len(), "planned batch");
        Ok(BatchPlan {
            units,
            total,
            skipped,
        })
    }
}
