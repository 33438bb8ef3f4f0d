//! CPU affinity for the event bus distributor thread.
//!
//! Pinning the distributor to an isolated core keeps it off whatever core
//! the scheduler would otherwise migrate it to, avoiding the cache
//! evictions and latency jitter that come with being moved mid-tick.

use anyhow::Result;
use core_affinity::CoreId;

/// Pins the current thread to a specific CPU core.
///
/// ```no_run
/// use riptide_core::perf::cpu::pin_to_core;
/// pin_to_core(2).expect("failed to pin to core 2");
/// ```
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };

    if core_affinity::set_for_current(core_id) {
        tracing::info!(core, "pinned thread to CPU core");
        Ok(())
    } else {
        anyhow::bail!("failed to pin thread to core {core}")
    }
}

/// Number of available CPU cores.
pub fn num_cores() -> usize {
    core_affinity::get_core_ids().map(|ids| ids.len()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_cores_is_at_least_one() {
        assert!(num_cores() > 0);
    }

    #[test]
    fn pin_to_core_does_not_panic() {
        if num_cores() > 1 {
            let _ = pin_to_core(0);
        }
    }
}
