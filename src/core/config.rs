use super::features::{Feature, UnknownFeature};
use super::hardware::CapabilitySnapshot;
use thiserror::Error;

/// Comma-separated feature names to report as unavailable.
pub const DISABLE_ENV: &str = "CPU_PROBE_DISABLE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CPU_PROBE_DISABLE: {0}")]
    UnknownFeature(#[from] UnknownFeature),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeConfig {
    pub disabled: Vec<Feature>,
}

impl ProbeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(DISABLE_ENV) {
            Ok(list) => Self::parse_disabled(&list),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn parse_disabled(list: &str) -> Result<Self, ConfigError> {
        let disabled = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse::<Feature>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { disabled })
    }

    pub fn apply(&self, snapshot: &CapabilitySnapshot) -> CapabilitySnapshot {
        CapabilitySnapshot {
            extensions: snapshot.extensions.without(&self.disabled),
            ..snapshot.clone()
        }
    }
}
