//! Runtime x86 capability probe.
//!
//! Reads the CPUID leaves once, gates the AVX family on the register state the
//! operating system actually saves (XCR0), and freezes the result into a
//! [`CapabilitySnapshot`](crate::core::hardware::CapabilitySnapshot).

pub mod core;
pub mod cpuid;
pub mod strconv;

pub use crate::core::features::{Feature, FeatureFlags};
pub use crate::core::hardware::CapabilitySnapshot;
pub use crate::cpuid::{CpuidSource, LeafResult};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use crate::core::runtime::system_info;
