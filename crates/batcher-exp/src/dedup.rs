use tracing::{debug, info};

use crate::dispatch::Dispatchable;

/// True when the unit's marker file already exists.
pub fn is_completed<D: Dispatchable + ?Sized>(unit: &D) -> bool {
    unit.marker().map(|path| path.is_file()).unwrap_or(false)
}

/// Drops units whose marker exists, keeping the order of the rest.
///
/// Units whose marker cannot be rendered are kept; the failure resurfaces
/// when the unit is dispatched.
pub fn remove_completed<D: Dispatchable>(units: Vec<D>) -> Vec<D> {
    let before = units.len();
    let kept: Vec<D> = units
        .into_iter()
        .filter(|unit| {
            let done = is_completed(unit);
            if done {
                debug!(name = ?unit.name().ok(), "skipping completed job");
            }
            !done
        })
        .collect();
    if kept.len() < before {
        info!(skipped = before - kept.len(), remaining = kept.len(), "removed completed jobs");
    }
    kept
}
