//! Hardware Detection Module
//! Queries CPU features at runtime and freezes them into one snapshot.

use super::features::FeatureFlags;
use super::gate::OsGate;
use super::identity::IdentityStrings;
use crate::cpuid::leaves::LeafCache;
use crate::cpuid::CpuidSource;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    pub vendor: String,
    pub brand: String,
    pub extensions: FeatureFlags,
}

impl CapabilitySnapshot {
    /// Probe the executing processor.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn detect() -> Self {
        Self::from_source(&crate::cpuid::NativeCpuid::new())
    }

    /// Build a snapshot from any CPUID source. Never fails: missing leaves
    /// mean false flags and empty strings.
    pub fn from_source<S: CpuidSource>(source: &S) -> Self {
        let leaves = LeafCache::collect(source);
        let gate = OsGate::probe(&leaves, source);
        let IdentityStrings { vendor, brand } = IdentityStrings::assemble(&leaves);
        let extensions = FeatureFlags::extract(&leaves, &gate);

        Self {
            vendor,
            brand,
            extensions,
        }
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path, pretty: bool) -> Result<(), ExportError> {
        let json = if pretty { self.to_json_pretty()? } else { self.to_json()? };
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
