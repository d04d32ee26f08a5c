//! Identity String Assembler
//!
//! Vendor ID from leaf 0 (EBX, EDX, ECX) and brand string from extended
//! leaves 0x8000_0002..=0x8000_0004. Register bytes are little-endian.

use crate::cpuid::leaves::LeafCache;
use crate::cpuid::{BASIC_INFO, BRAND_STRING_FIRST, BRAND_STRING_LAST};
use serde::{Deserialize, Serialize};

pub const VENDOR_LEN: usize = 12;
pub const BRAND_LEN: usize = 48;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityStrings {
    pub vendor: String,
    pub brand: String,
}

impl IdentityStrings {
    pub fn assemble(leaves: &LeafCache) -> Self {
        Self {
            vendor: vendor(leaves),
            brand: brand(leaves),
        }
    }
}

fn vendor(leaves: &LeafCache) -> String {
    let Some(leaf0) = leaves.get(BASIC_INFO) else {
        return String::new();
    };
    let mut buf = [0u8; VENDOR_LEN];
    for (chunk, word) in buf.chunks_exact_mut(4).zip([leaf0.ebx, leaf0.edx, leaf0.ecx]) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    c_string(&buf)
}

fn brand(leaves: &LeafCache) -> String {
    match leaves.max_extended() {
        Some(max) if max >= BRAND_STRING_LAST => {}
        _ => return String::new(),
    }
    let mut buf = [0u8; BRAND_LEN];
    let words = (BRAND_STRING_FIRST..=BRAND_STRING_LAST)
        .flat_map(|leaf| leaves.leaf_or_zero(leaf).words());
    for (chunk, word) in buf.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    c_string(&buf)
}

/// Text up to the first NUL. Padding before it (spaces included) is kept.
fn c_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpuid::{LeafResult, SyntheticCpuid};

    fn pack(text: &[u8]) -> Vec<u32> {
        text.chunks(4)
            .map(|c| {
                let mut word = [0u8; 4];
                word[..c.len()].copy_from_slice(c);
                u32::from_le_bytes(word)
            })
            .collect()
    }

    fn with_brand(cpu: SyntheticCpuid, brand: &[u8; 48]) -> SyntheticCpuid {
        let w = pack(brand);
        cpu.with_leaf(0x8000_0000, LeafResult::new(0x8000_0004, 0, 0, 0))
            .with_leaf(0x8000_0002, LeafResult::new(w[0], w[1], w[2], w[3]))
            .with_leaf(0x8000_0003, LeafResult::new(w[4], w[5], w[6], w[7]))
            .with_leaf(0x8000_0004, LeafResult::new(w[8], w[9], w[10], w[11]))
    }

    #[test]
    fn test_vendor_register_order() {
        // "GenuineIntel" = EBX "Genu", EDX "ineI", ECX "ntel"
        let cpu = SyntheticCpuid::new().with_leaf(0, LeafResult::new(0, 0x756e_6547, 0x6c65_746e, 0x4965_6e69));
        let id = IdentityStrings::assemble(&LeafCache::collect(&cpu));
        assert_eq!(id.vendor, "GenuineIntel");
        assert_eq!(id.brand, "");
    }

    #[test]
    fn test_vendor_amd() {
        let cpu = SyntheticCpuid::new().with_leaf(0, LeafResult::new(0x10, 0x6874_7541, 0x444d_4163, 0x6974_6e65));
        let id = IdentityStrings::assemble(&LeafCache::collect(&cpu));
        assert_eq!(id.vendor, "AuthenticAMD");
    }

    #[test]
    fn test_brand_preserves_padding() {
        // full 48 bytes, no terminator inside the buffer
        let text = b"       Intel(R) Xeon(R) CPU E5-2680 v4 @ 2.40GHz";
        let cpu = with_brand(SyntheticCpuid::new(), text);
        let id = IdentityStrings::assemble(&LeafCache::collect(&cpu));
        assert_eq!(id.brand.as_bytes(), &text[..]);
        assert!(id.brand.starts_with("       Intel"));
    }

    #[test]
    fn test_brand_stops_at_nul() {
        let mut raw = [0u8; 48];
        let text = b"AMD Ryzen 9 7950X 16-Core Processor   ";
        raw[..text.len()].copy_from_slice(text);
        let cpu = with_brand(SyntheticCpuid::new(), &raw);
        let id = IdentityStrings::assemble(&LeafCache::collect(&cpu));
        assert_eq!(id.brand, "AMD Ryzen 9 7950X 16-Core Processor   ");
    }

    #[test]
    fn test_brand_requires_last_leaf() {
        let cpu = SyntheticCpuid::new()
            .with_leaf(0x8000_0000, LeafResult::new(0x8000_0003, 0, 0, 0))
            .with_leaf(0x8000_0002, LeafResult::new(0x6c65_746e, 0, 0, 0));
        let id = IdentityStrings::assemble(&LeafCache::collect(&cpu));
        assert_eq!(id.brand, "");
    }
}
