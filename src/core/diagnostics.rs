use super::features::{Feature, FeatureFlags};
use super::gate::OsGate;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use super::hardware::CapabilitySnapshot;
use super::runtime::CoreSnapshot;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Inconsistent(Vec<String>),
}

impl HealthStatus {
    fn from_findings(findings: Vec<String>) -> Self {
        if findings.is_empty() {
            return HealthStatus::Healthy;
        }
        for finding in &findings {
            warn!("{}", finding);
        }
        HealthStatus::Inconsistent(findings)
    }
}

pub struct Diagnostics;

impl Diagnostics {
    /// Cross-checks a snapshot of the running machine.
    /// 1. Gating: no AVX-class flag without its prerequisites.
    /// 2. Flags agree with the standard library's runtime detection.
    /// 3. Vendor and brand agree with what the OS reports (when it reports).
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn check(snapshot: &CapabilitySnapshot) -> HealthStatus {
        use crate::cpuid::leaves::LeafCache;
        use crate::cpuid::NativeCpuid;

        let cpu = NativeCpuid::new();
        let gate = OsGate::probe(&LeafCache::collect(&cpu), &cpu);

        let mut findings = Self::gating_findings(&snapshot.extensions, &gate);
        findings.extend(Self::std_findings(&snapshot.extensions));

        findings.extend(Self::os_identity_findings(snapshot));

        HealthStatus::from_findings(findings)
    }

    /// Check 1 alone against a given gate; usable on synthetic snapshots.
    pub fn check_gating(flags: &FeatureFlags, gate: &OsGate) -> HealthStatus {
        HealthStatus::from_findings(Self::gating_findings(flags, gate))
    }

    /// Every core should see the same configuration.
    pub fn check_cores(cores: &[CoreSnapshot]) -> HealthStatus {
        let Some(first) = cores.first() else {
            return HealthStatus::Healthy;
        };
        let findings = cores
            .iter()
            .skip(1)
            .filter(|c| c.snapshot != first.snapshot)
            .map(|c| format!("Core {} differs from core {}", c.core_id, first.core_id))
            .collect();
        HealthStatus::from_findings(findings)
    }

    fn gating_findings(flags: &FeatureFlags, gate: &OsGate) -> Vec<String> {
        Feature::ALL
            .iter()
            .filter(|&&f| flags.has(f))
            .flat_map(|&f| f.register_classes().iter().map(move |&class| (f, class)))
            .filter(|&(_, class)| !gate.is_enabled(class))
            .map(|(f, class)| format!("{} reported but OS does not save {:?} state", f, class))
            .collect()
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn std_findings(flags: &FeatureFlags) -> Vec<String> {
        Feature::ALL
            .iter()
            .filter(|&&f| flags.has(f) != std_detects(f))
            .map(|&f| format!("{} disagrees with std detection (probe: {})", f, flags.has(f)))
            .collect()
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    fn os_identity_findings(snapshot: &CapabilitySnapshot) -> Vec<String> {
        let sys = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::everything()));
        let mut findings = Vec::new();

        if let Some(cpu) = sys.cpus().first() {
            let vendor = cpu.vendor_id().trim();
            if !vendor.is_empty() && vendor != snapshot.vendor.trim() {
                findings.push(format!("Vendor mismatch: probe {:?}, OS {:?}", snapshot.vendor, vendor));
            }
            let brand = cpu.brand().trim();
            if !brand.is_empty() && !snapshot.brand.is_empty() && brand != snapshot.brand.trim() {
                findings.push(format!("Brand mismatch: probe {:?}, OS {:?}", snapshot.brand.trim(), brand));
            }
        }
        findings
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn std_detects(feature: Feature) -> bool {
    match feature {
        Feature::Sse => is_x86_feature_detected!("sse"),
        Feature::Sse2 => is_x86_feature_detected!("sse2"),
        Feature::Sse3 => is_x86_feature_detected!("sse3"),
        Feature::Ssse3 => is_x86_feature_detected!("ssse3"),
        Feature::Sse41 => is_x86_feature_detected!("sse4.1"),
        Feature::Sse42 => is_x86_feature_detected!("sse4.2"),
        Feature::Avx => is_x86_feature_detected!("avx"),
        Feature::Avx2 => is_x86_feature_detected!("avx2"),
        Feature::Avx512f => is_x86_feature_detected!("avx512f"),
        Feature::Avx512bw => is_x86_feature_detected!("avx512bw"),
        Feature::Popcnt => is_x86_feature_detected!("popcnt"),
        Feature::Bmi => is_x86_feature_detected!("bmi1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hardware::CapabilitySnapshot;

    fn flags_with(features: &[Feature]) -> FeatureFlags {
        let all = FeatureFlags {
            sse: true,
            sse2: true,
            sse3: true,
            ssse3: true,
            sse41: true,
            sse42: true,
            avx: true,
            avx2: true,
            avx512f: true,
            avx512bw: true,
            popcnt: true,
            bmi: true,
        };
        let off: Vec<Feature> = Feature::ALL.iter().copied().filter(|f| !features.contains(f)).collect();
        all.without(&off)
    }

    #[test]
    fn test_gating_healthy() {
        let gate = OsGate::from_xcr0(0xE7);
        assert_eq!(Diagnostics::check_gating(&flags_with(&Feature::ALL), &gate), HealthStatus::Healthy);

        let gate = OsGate::disabled();
        assert_eq!(Diagnostics::check_gating(&flags_with(&[Feature::Sse, Feature::Bmi]), &gate), HealthStatus::Healthy);
    }

    #[test]
    fn test_gating_violation() {
        let gate = OsGate::from_xcr0(0x07);
        match Diagnostics::check_gating(&flags_with(&[Feature::Avx2, Feature::Avx512bw]), &gate) {
            HealthStatus::Inconsistent(findings) => {
                // opmask and zmm both missing
                assert_eq!(findings.len(), 2);
                assert!(findings.iter().all(|f| f.starts_with("avx512bw")));
            }
            HealthStatus::Healthy => panic!("expected a finding"),
        }
    }

    #[test]
    fn test_avx512_without_vector_state() {
        let gate = OsGate::from_xcr0(0xE0);
        let status = Diagnostics::check_gating(&flags_with(&[Feature::Avx512f]), &gate);
        assert_eq!(
            status,
            HealthStatus::Inconsistent(vec!["avx512f reported but OS does not save Vector state".to_string()])
        );
    }

    #[test]
    fn test_check_cores() {
        let a = CapabilitySnapshot { vendor: "GenuineIntel".to_string(), ..Default::default() };
        let b = CapabilitySnapshot { vendor: "AuthenticAMD".to_string(), ..Default::default() };
        let cores = vec![
            CoreSnapshot { core_id: 0, snapshot: a.clone() },
            CoreSnapshot { core_id: 1, snapshot: a.clone() },
        ];
        assert_eq!(Diagnostics::check_cores(&cores), HealthStatus::Healthy);
        assert_eq!(Diagnostics::check_cores(&[]), HealthStatus::Healthy);

        let cores = vec![
            CoreSnapshot { core_id: 0, snapshot: a },
            CoreSnapshot { core_id: 3, snapshot: b },
        ];
        assert_eq!(
            Diagnostics::check_cores(&cores),
            HealthStatus::Inconsistent(vec!["Core 3 differs from core 0".to_string()])
        );
    }

    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    #[test]
    fn test_native_gating_and_std_agree() {
        use crate::cpuid::leaves::LeafCache;
        use crate::cpuid::NativeCpuid;

        let cpu = NativeCpuid::new();
        let gate = OsGate::probe(&LeafCache::collect(&cpu), &cpu);
        let snap = CapabilitySnapshot::detect();
        assert_eq!(Diagnostics::check_gating(&snap.extensions, &gate), HealthStatus::Healthy);
        assert!(Diagnostics::std_findings(&snap.extensions).is_empty());
    }
}
