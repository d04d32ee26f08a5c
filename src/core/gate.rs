//! OS-Enablement Gate
//!
//! CPUID says what the silicon can do; XCR0 says which register state the
//! operating system saves across context switches. AVX-class flags are only
//! usable when both agree.

use crate::cpuid::leaves::LeafCache;
use crate::cpuid::{CpuidSource, FEATURE_INFO};
use bitflags::bitflags;
use tracing::debug;

/// CPUID.1:ECX.XSAVE
const XSAVE_BIT: u32 = 1 << 26;
/// CPUID.1:ECX.OSXSAVE
const OSXSAVE_BIT: u32 = 1 << 27;

bitflags! {
    /// XCR0 state components.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct XFeatures: u64 {
        const X87 = 1 << 0;
        const SSE = 1 << 1;
        const AVX = 1 << 2;
        const OPMASK = 1 << 5;
        const ZMM_HI256 = 1 << 6;
        const HI16_ZMM = 1 << 7;

        const _ = !0;
    }
}

impl XFeatures {
    /// xmm + ymm
    pub const VECTOR: Self = Self::SSE.union(Self::AVX);
    /// k0-k7
    pub const MASK: Self = Self::OPMASK;
    /// opmask + both zmm halves
    pub const EXTENDED_VECTOR: Self = Self::OPMASK.union(Self::ZMM_HI256).union(Self::HI16_ZMM);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterClass {
    /// 128/256-bit (xmm, ymm)
    Vector,
    /// AVX-512 predicate registers
    Mask,
    /// 512-bit (zmm)
    ExtendedVector,
}

impl RegisterClass {
    pub fn required(self) -> XFeatures {
        match self {
            RegisterClass::Vector => XFeatures::VECTOR,
            RegisterClass::Mask => XFeatures::MASK,
            RegisterClass::ExtendedVector => XFeatures::EXTENDED_VECTOR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsGate {
    xcr0: XFeatures,
}

impl OsGate {
    /// Nothing enabled: no XSAVE, or the OS never turned it on.
    pub fn disabled() -> Self {
        Self { xcr0: XFeatures::empty() }
    }

    pub fn from_xcr0(xcr0: u64) -> Self {
        Self { xcr0: XFeatures::from_bits_retain(xcr0) }
    }

    /// Read XCR0 through `source`, but only when leaf 1 reports both XSAVE and
    /// OSXSAVE. XGETBV faults otherwise.
    pub fn probe<S: CpuidSource>(leaves: &LeafCache, source: &S) -> Self {
        let ecx = leaves.leaf_or_zero(FEATURE_INFO).ecx;
        let xsave = ecx & XSAVE_BIT != 0;
        let osxsave = ecx & OSXSAVE_BIT != 0;

        if !(xsave && osxsave) {
            debug!(xsave, osxsave, "extended state save not enabled");
            return Self::disabled();
        }

        let gate = Self::from_xcr0(source.xcr0());
        debug!(xcr0 = format_args!("{:#x}", gate.xcr0.bits()), "read xcr0");
        gate
    }

    pub fn is_enabled(&self, class: RegisterClass) -> bool {
        self.xcr0.contains(class.required())
    }

    pub fn xcr0(&self) -> XFeatures {
        self.xcr0
    }
}
