#[cfg(target_arch = "x86")]
use std::arch::x86 as arch;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64 as arch;

use super::{CpuidSource, LeafResult};

/// XCR0 selector for XGETBV.
const XCR_XFEATURE_ENABLED_MASK: u32 = 0;

/// The executing processor.
#[derive(Debug, Copy, Clone, Default)]
pub struct NativeCpuid;

impl NativeCpuid {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_arch = "x86_64")]
#[allow(unused_unsafe)]
fn cpuid_impl(leaf: u32, subleaf: u32) -> LeafResult {
    // CPUID is architecturally guaranteed on x86_64.
    let r = unsafe { arch::__cpuid_count(leaf, subleaf) };
    LeafResult::new(r.eax, r.ebx, r.ecx, r.edx)
}

#[cfg(target_arch = "x86")]
#[allow(unused_unsafe)]
fn cpuid_impl(leaf: u32, subleaf: u32) -> LeafResult {
    // Pre-586 parts have no CPUID; they report nothing.
    if !arch::has_cpuid() {
        return LeafResult::default();
    }
    let r = unsafe { arch::__cpuid_count(leaf, subleaf) };
    LeafResult::new(r.eax, r.ebx, r.ecx, r.edx)
}

impl CpuidSource for NativeCpuid {
    fn query(&self, leaf: u32, subleaf: u32) -> LeafResult {
        cpuid_impl(leaf, subleaf)
    }

    fn xcr0(&self) -> u64 {
        // SAFETY: the gate calls this only after CPUID.1:ECX reports XSAVE and
        // OSXSAVE, so XGETBV is enabled.
        unsafe { arch::_xgetbv(XCR_XFEATURE_ENABLED_MASK) }
    }
}
