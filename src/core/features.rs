//! Feature Bit Extractor
//!
//! Maps fixed bit positions of leaves 1 and 7 to named flags. AVX-class flags
//! are ANDed with the OS gate.

use super::gate::{OsGate, RegisterClass};
use crate::cpuid::leaves::LeafCache;
use crate::cpuid::{EXTENDED_FEATURES, FEATURE_INFO};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown feature: {0}")]
pub struct UnknownFeature(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    Sse41,
    Sse42,
    Avx,
    Avx2,
    Avx512f,
    Avx512bw,
    Popcnt,
    Bmi,
}

impl Feature {
    pub const ALL: [Feature; 12] = [
        Feature::Sse,
        Feature::Sse2,
        Feature::Sse3,
        Feature::Ssse3,
        Feature::Sse41,
        Feature::Sse42,
        Feature::Avx,
        Feature::Avx2,
        Feature::Avx512f,
        Feature::Avx512bw,
        Feature::Popcnt,
        Feature::Bmi,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Sse => "sse",
            Feature::Sse2 => "sse2",
            Feature::Sse3 => "sse3",
            Feature::Ssse3 => "ssse3",
            Feature::Sse41 => "sse41",
            Feature::Sse42 => "sse42",
            Feature::Avx => "avx",
            Feature::Avx2 => "avx2",
            Feature::Avx512f => "avx512f",
            Feature::Avx512bw => "avx512bw",
            Feature::Popcnt => "popcnt",
            Feature::Bmi => "bmi",
        }
    }

    /// Register classes the OS must save before this feature is usable.
    /// Empty for features with no extended register state.
    pub fn register_classes(self) -> &'static [RegisterClass] {
        match self {
            Feature::Avx | Feature::Avx2 => &[RegisterClass::Vector],
            Feature::Avx512f | Feature::Avx512bw => &[
                RegisterClass::Vector,
                RegisterClass::Mask,
                RegisterClass::ExtendedVector,
            ],
            _ => &[],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownFeature(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub sse: bool,
    pub sse2: bool,
    pub sse3: bool,
    pub ssse3: bool,
    pub sse41: bool,
    pub sse42: bool,
    pub avx: bool,
    pub avx2: bool,
    pub avx512f: bool,
    pub avx512bw: bool,
    pub popcnt: bool,
    pub bmi: bool,
}

#[inline]
fn bit(word: u32, index: u32) -> bool {
    word & (1 << index) != 0
}

impl FeatureFlags {
    /// Leaves the processor did not report read as zero, so their features
    /// come out false.
    pub fn extract(leaves: &LeafCache, gate: &OsGate) -> Self {
        let leaf1 = leaves.leaf_or_zero(FEATURE_INFO);
        let leaf7 = leaves.leaf_or_zero(EXTENDED_FEATURES);

        let usable = |f: Feature| f.register_classes().iter().all(|&c| gate.is_enabled(c));
        let vector = usable(Feature::Avx);
        let wide = usable(Feature::Avx512f);

        Self {
            sse: bit(leaf1.edx, 25),
            sse2: bit(leaf1.edx, 26),
            sse3: bit(leaf1.ecx, 0),
            ssse3: bit(leaf1.ecx, 9),
            sse41: bit(leaf1.ecx, 19),
            sse42: bit(leaf1.ecx, 20),
            avx: bit(leaf1.ecx, 28) && vector,
            avx2: bit(leaf7.ebx, 5) && vector,
            avx512f: bit(leaf7.ebx, 16) && wide,
            avx512bw: bit(leaf7.ebx, 30) && wide,
            popcnt: bit(leaf1.ecx, 23),
            bmi: bit(leaf7.ebx, 3),
        }
    }

    pub fn has(&self, feature: Feature) -> bool {
        match feature {
            Feature::Sse => self.sse,
            Feature::Sse2 => self.sse2,
            Feature::Sse3 => self.sse3,
            Feature::Ssse3 => self.ssse3,
            Feature::Sse41 => self.sse41,
            Feature::Sse42 => self.sse42,
            Feature::Avx => self.avx,
            Feature::Avx2 => self.avx2,
            Feature::Avx512f => self.avx512f,
            Feature::Avx512bw => self.avx512bw,
            Feature::Popcnt => self.popcnt,
            Feature::Bmi => self.bmi,
        }
    }

    fn slot(&mut self, feature: Feature) -> &mut bool {
        match feature {
            Feature::Sse => &mut self.sse,
            Feature::Sse2 => &mut self.sse2,
            Feature::Sse3 => &mut self.sse3,
            Feature::Ssse3 => &mut self.ssse3,
            Feature::Sse41 => &mut self.sse41,
            Feature::Sse42 => &mut self.sse42,
            Feature::Avx => &mut self.avx,
            Feature::Avx2 => &mut self.avx2,
            Feature::Avx512f => &mut self.avx512f,
            Feature::Avx512bw => &mut self.avx512bw,
            Feature::Popcnt => &mut self.popcnt,
            Feature::Bmi => &mut self.bmi,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, bool)> + '_ {
        Feature::ALL.iter().map(move |&f| (f, self.has(f)))
    }

    /// Names of the features that are set.
    pub fn enabled(&self) -> Vec<&'static str> {
        self.iter().filter(|(_, on)| *on).map(|(f, _)| f.name()).collect()
    }

    /// Copy with `disabled` cleared. Masking never sets a flag.
    pub fn without(&self, disabled: &[Feature]) -> Self {
        let mut masked = *self;
        for &feature in disabled {
            *masked.slot(feature) = false;
        }
        masked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpuid::{LeafResult, SyntheticCpuid};

    const FULL_XCR0: u64 = 0xE7;
    const XSAVE_OSXSAVE: u32 = (1 << 26) | (1 << 27);

    fn extract(cpu: &SyntheticCpuid) -> FeatureFlags {
        let cache = LeafCache::collect(cpu);
        let gate = OsGate::probe(&cache, cpu);
        FeatureFlags::extract(&cache, &gate)
    }

    fn cpu(ecx1: u32, edx1: u32, ebx7: u32, xcr0: u64) -> SyntheticCpuid {
        SyntheticCpuid::new()
            .with_leaf(0, LeafResult::new(7, 0, 0, 0))
            .with_leaf(1, LeafResult::new(0, 0, ecx1, edx1))
            .with_leaf(7, LeafResult::new(0, ebx7, 0, 0))
            .with_xcr0(xcr0)
    }

    #[test]
    fn test_sse3_bit_only() {
        let flags = extract(&cpu(1 << 0, 0, 0, 0));
        assert!(flags.sse3);
        assert!(!flags.ssse3);
        assert!(!flags.sse41);
        assert!(!flags.sse42);
        assert!(!flags.popcnt);
        assert!(!flags.avx);
        assert_eq!(flags.enabled(), vec!["sse3"]);
    }

    #[test]
    fn test_leaf1_bit_positions() {
        let flags = extract(&cpu((1 << 9) | (1 << 19) | (1 << 20) | (1 << 23), (1 << 25) | (1 << 26), 0, 0));
        assert!(flags.sse && flags.sse2 && flags.ssse3 && flags.sse41 && flags.sse42 && flags.popcnt);
        assert!(!flags.sse3);
    }

    #[test]
    fn test_leaf7_bit_positions() {
        let ebx7 = (1 << 3) | (1 << 5) | (1 << 16) | (1 << 30);
        let flags = extract(&cpu(XSAVE_OSXSAVE, 0, ebx7, FULL_XCR0));
        assert!(flags.bmi && flags.avx2 && flags.avx512f && flags.avx512bw);
        // leaf 1 AVX bit not set
        assert!(!flags.avx);
    }

    #[test]
    fn test_avx_gated_on_os() {
        let ecx = (1 << 28) | XSAVE_OSXSAVE;
        let ebx7 = (1 << 5) | (1 << 16) | (1 << 30);

        let flags = extract(&cpu(ecx, 0, ebx7, FULL_XCR0));
        assert!(flags.avx && flags.avx2 && flags.avx512f && flags.avx512bw);

        // ymm saved, zmm not
        let flags = extract(&cpu(ecx, 0, ebx7, 0x07));
        assert!(flags.avx && flags.avx2);
        assert!(!flags.avx512f && !flags.avx512bw);

        // zmm bits without ymm still rejects the whole family
        let flags = extract(&cpu(ecx, 0, ebx7, 0xE3));
        assert!(!flags.avx && !flags.avx2 && !flags.avx512f && !flags.avx512bw);

        // OS never enabled XSAVE
        let flags = extract(&cpu((1 << 28) | (1 << 26), 0, ebx7, FULL_XCR0));
        assert!(!flags.avx && !flags.avx2 && !flags.avx512f);
    }

    #[test]
    fn test_bmi_not_gated() {
        let flags = extract(&cpu(0, 0, 1 << 3, 0));
        assert!(flags.bmi);
    }

    #[test]
    fn test_missing_leaf7() {
        let cpu = SyntheticCpuid::new()
            .with_leaf(0, LeafResult::new(1, 0, 0, 0))
            .with_leaf(1, LeafResult::new(0, 0, XSAVE_OSXSAVE | (1 << 28), 1 << 25))
            // present in the table but beyond the reported maximum
            .with_leaf(7, LeafResult::new(0, u32::MAX, 0, 0))
            .with_xcr0(FULL_XCR0);
        let flags = extract(&cpu);
        assert!(flags.sse && flags.avx);
        assert!(!flags.bmi && !flags.avx2 && !flags.avx512f && !flags.avx512bw);
    }

    #[test]
    fn test_feature_names_parse() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>(), Ok(feature));
        }
        assert_eq!(" AVX512F ".parse::<Feature>(), Ok(Feature::Avx512f));
        assert_eq!("avx3".parse::<Feature>(), Err(UnknownFeature("avx3".to_string())));
    }

    #[test]
    fn test_avx512_needs_vector_state() {
        assert!(Feature::Avx512bw.register_classes().contains(&RegisterClass::Vector));
        assert!(Feature::Sse42.register_classes().is_empty());

        // zmm and opmask saved, xmm/ymm not
        let ebx7 = (1 << 16) | (1 << 30);
        let flags = extract(&cpu(XSAVE_OSXSAVE, 0, ebx7, 0xE0));
        assert!(!flags.avx512f && !flags.avx512bw);
    }

    #[test]
    fn test_without_only_clears() {
        let flags = FeatureFlags { sse: true, avx: true, ..Default::default() };
        let masked = flags.without(&[Feature::Avx, Feature::Avx2]);
        assert!(masked.sse);
        assert!(!masked.avx);
        assert!(!masked.avx2);
    }

    #[test]
    fn test_serde_field_names() {
        let flags = FeatureFlags { sse41: true, ..Default::default() };
        let json = serde_json::to_value(flags).unwrap();
        assert_eq!(json["sse41"], true);
        assert_eq!(json["avx512bw"], false);
    }
}
