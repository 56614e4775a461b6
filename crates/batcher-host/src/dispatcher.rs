use batcher_core::BatcherError;
use batcher_exp::{DispatchUnit, Dispatchable};
use tracing::{debug, info};

use crate::backend::ExecutionBackend;

/// One successful launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRecord {
    pub name: String,
    pub backend_id: String,
}

/// Hands dispatch units to a backend in order.
pub struct Dispatcher {
    backend: Box<dyn ExecutionBackend>,
}

impl Dispatcher {
    pub fn new(backend: Box<dyn ExecutionBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn dispatch(&mut self, unit: &DispatchUnit) -> Result<LaunchRecord, BatcherError> {
        let name = unit.name()?;
        debug!(name = %name, members = unit.len(), "dispatching");
        let backend_id = self.backend.run(unit)?;
        info!(name = %name, backend = self.backend.name(), id = %backend_id, "launched");
        Ok(LaunchRecord { name, backend_id })
    }

    /// Launches every unit, stopping at the first failure. Units launched
    /// before the failure stay launched.
    pub fn dispatch_all(
        &mut self,
        units: &[DispatchUnit],
    ) -> Result<Vec<LaunchRecord>, BatcherError> {
        units.iter().map(|unit| self.dispatch(unit)).collect()
    }
}
