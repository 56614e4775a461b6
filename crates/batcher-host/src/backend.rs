use batcher_core::BatcherError;
use batcher_exp::Dispatchable;

/// Something that can launch a dispatch unit.
///
/// `run` returns the identifier the backend assigned to the launch (a
/// scheduler job id, a process id, ...). Launching does not wait for the
/// unit's completion unless the backend is inherently synchronous.
pub trait ExecutionBackend {
    /// Registry name of the backend.
    fn name(&self) -> &str;

    fn run(&mut self, unit: &dyn Dispatchable) -> Result<String, BatcherError>;
}
