//! Process-wide holder for the snapshot, plus per-core probing.
//!
//! The probe itself is a pure function; caching it for the lifetime of the
//! process happens here.

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use super::config::ProbeConfig;
use super::hardware::CapabilitySnapshot;
use std::sync::OnceLock;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use tracing::{info, warn};

/// Snapshot taken on one logical core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSnapshot {
    pub core_id: usize,
    pub snapshot: CapabilitySnapshot,
}

/// Compute once, then hand out the same snapshot for the rest of the process.
///
/// Concurrent first callers may each run the probe; only one result is kept.
pub fn cached<F>(cell: &'static OnceLock<CapabilitySnapshot>, compute: F) -> &'static CapabilitySnapshot
where
    F: FnOnce() -> CapabilitySnapshot,
{
    cell.get_or_init(compute)
}

/// The executing machine's capabilities, masked by `CPU_PROBE_DISABLE`.
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn system_info() -> &'static CapabilitySnapshot {
    static SYSTEM: OnceLock<CapabilitySnapshot> = OnceLock::new();
    cached(&SYSTEM, || {
        let detected = CapabilitySnapshot::detect();
        let snapshot = match ProbeConfig::from_env() {
            Ok(config) => config.apply(&detected),
            Err(e) => {
                warn!("ignoring configuration: {}", e);
                detected
            }
        };
        info!(
            vendor = %snapshot.vendor,
            brand = %snapshot.brand.trim(),
            features = ?snapshot.extensions.enabled(),
            "cpu capabilities detected"
        );
        snapshot
    })
}

/// Pin current thread to a specific core ID.
pub fn pin_thread(core_id: usize) -> bool {
    let core_ids = core_affinity::get_core_ids();
    if let Some(ids) = core_ids {
        if core_id < ids.len() {
            return core_affinity::set_for_current(ids[core_id]);
        }
    }
    false
}

/// Run `probe` on every logical core, one pinned thread per core. The probe
/// receives the index of the core it is pinned to.
///
/// Cores that refuse pinning are skipped. Returns an empty list when the
/// platform does not expose core IDs.
pub fn probe_each_core<F>(probe: F) -> Vec<CoreSnapshot>
where
    F: Fn(usize) -> CapabilitySnapshot + Send + Sync + Copy + 'static,
{
    let count = core_affinity::get_core_ids().map(|ids| ids.len()).unwrap_or(0);

    let handles: Vec<_> = (0..count)
        .map(|core_id| {
            std::thread::spawn(move || {
                if !pin_thread(core_id) {
                    return None;
                }
                Some(CoreSnapshot { core_id, snapshot: probe(core_id) })
            })
        })
        .collect();

    handles
        .into_iter()
        .filter_map(|h| h.join().ok().flatten())
        .collect()
}
