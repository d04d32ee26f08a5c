use super::{CpuidSource, LeafResult, BASIC_INFO, EXTENDED_INFO};
use std::ops::RangeInclusive;
use tracing::{debug, trace, warn};

/// Real processors report a few dozen leaves per family; anything past this
/// is most likely a broken hypervisor. The scan still honours it.
const LEAF_SPAN_WARN: u32 = 0x1000;

/// Leaves after the family head, up to and including `max`. Empty when `max`
/// is at or below `base`; never wraps, even for `max == u32::MAX`.
fn leaf_range(base: u32, max: u32) -> RangeInclusive<u32> {
    if max <= base {
        // canonical empty range
        return 1..=0;
    }
    (base + 1)..=max
}

/// Every basic and extended leaf the processor reported, captured once.
///
/// Leaf numbers are always `u32`: the extended maximum has the top bit set and
/// must be compared unsigned.
#[derive(Debug, Clone, Default)]
pub struct LeafCache {
    basic: Vec<LeafResult>,
    extended: Vec<LeafResult>,
}

impl LeafCache {
    /// Scan `0..=max_basic` and `0x8000_0000..=max_extended`, sub-leaf 0.
    pub fn collect<S: CpuidSource>(source: &S) -> Self {
        let basic = Self::scan(source, BASIC_INFO);
        let extended = Self::scan(source, EXTENDED_INFO);

        debug!(
            basic_leaves = basic.len(),
            extended_leaves = extended.len(),
            "captured cpuid leaves"
        );

        Self { basic, extended }
    }

    fn scan<S: CpuidSource>(source: &S, base: u32) -> Vec<LeafResult> {
        let head = source.query(base, 0);
        let max = head.eax;

        // A maximum below the base means the family is absent.
        if max < base {
            debug!(
                base = format_args!("{:#x}", base),
                max = format_args!("{:#x}", max),
                "leaf family not supported"
            );
            return Vec::new();
        }

        if max - base > LEAF_SPAN_WARN {
            warn!(
                base = format_args!("{:#x}", base),
                max = format_args!("{:#x}", max),
                "processor reports an implausible number of leaves"
            );
        }

        let mut leaves = vec![head];
        for leaf in leaf_range(base, max) {
            let result = source.query(leaf, 0);
            trace!(leaf = format_args!("{:#x}", leaf), ?result, "cpuid");
            leaves.push(result);
        }
        leaves
    }

    pub fn get(&self, leaf: u32) -> Option<&LeafResult> {
        if leaf >= EXTENDED_INFO {
            self.extended.get((leaf - EXTENDED_INFO) as usize)
        } else {
            self.basic.get(leaf as usize)
        }
    }

    /// Cached leaf, or all-zero words when the processor did not report it.
    pub fn leaf_or_zero(&self, leaf: u32) -> LeafResult {
        self.get(leaf).copied().unwrap_or_default()
    }

    /// Highest basic leaf, `None` when even leaf 0 was not captured.
    pub fn max_basic(&self) -> Option<u32> {
        self.basic.first().map(|l| l.eax)
    }

    /// Highest extended leaf, `None` when the extended family is absent.
    pub fn max_extended(&self) -> Option<u32> {
        self.extended.first().map(|l| l.eax)
    }

    pub fn basic_len(&self) -> usize {
        self.basic.len()
    }

    pub fn extended_len(&self) -> usize {
        self.extended.len()
    }
}
