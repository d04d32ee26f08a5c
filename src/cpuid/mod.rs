//! CPUID Access Layer
//! The raw query seam plus the leaf cache built on top of it.

pub mod leaves;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub mod native;

use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use native::NativeCpuid;

pub const BASIC_INFO: u32 = 0x0000_0000;
pub const FEATURE_INFO: u32 = 0x0000_0001;
pub const EXTENDED_FEATURES: u32 = 0x0000_0007;
pub const EXTENDED_INFO: u32 = 0x8000_0000;
pub const BRAND_STRING_FIRST: u32 = 0x8000_0002;
pub const BRAND_STRING_LAST: u32 = 0x8000_0004;

/// The four result words of one CPUID query, named by register.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct LeafResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

impl LeafResult {
    pub const fn new(eax: u32, ebx: u32, ecx: u32, edx: u32) -> Self {
        Self { eax, ebx, ecx, edx }
    }

    /// Words in register order (eax, ebx, ecx, edx).
    pub fn words(&self) -> [u32; 4] {
        [self.eax, self.ebx, self.ecx, self.edx]
    }
}

/// Anything that can answer CPUID and XGETBV.
///
/// `NativeCpuid` talks to the executing processor; tests plug in a
/// [`SyntheticCpuid`] instead.
pub trait CpuidSource {
    /// Issue one query. Never fails; unsupported leaves return whatever the
    /// source returns for them.
    fn query(&self, leaf: u32, subleaf: u32) -> LeafResult;

    /// XCR0, the OS-enabled extended state mask.
    ///
    /// Only meaningful (and only safe to call on real hardware) once CPUID
    /// leaf 1 reports both XSAVE and OSXSAVE.
    fn xcr0(&self) -> u64;
}

impl<S: CpuidSource + ?Sized> CpuidSource for &S {
    fn query(&self, leaf: u32, subleaf: u32) -> LeafResult {
        (**self).query(leaf, subleaf)
    }

    fn xcr0(&self) -> u64 {
        (**self).xcr0()
    }
}

/// Table-driven source for simulating a processor.
///
/// Leaves that were never set read back as all-zero words.
#[derive(Debug, Clone, Default)]
pub struct SyntheticCpuid {
    leaves: HashMap<(u32, u32), LeafResult>,
    xcr0: u64,
}

impl SyntheticCpuid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leaf(mut self, leaf: u32, result: LeafResult) -> Self {
        self.leaves.insert((leaf, 0), result);
        self
    }

    pub fn with_subleaf(mut self, leaf: u32, subleaf: u32, result: LeafResult) -> Self {
        self.leaves.insert((leaf, subleaf), result);
        self
    }

    pub fn with_xcr0(mut self, xcr0: u64) -> Self {
        self.xcr0 = xcr0;
        self
    }
}

impl CpuidSource for SyntheticCpuid {
    fn query(&self, leaf: u32, subleaf: u32) -> LeafResult {
        self.leaves
            .get(&(leaf, subleaf))
            .copied()
            .unwrap_or_else(LeafResult::zeroed)
    }

    fn xcr0(&self) -> u64 {
        self.xcr0
    }
}
