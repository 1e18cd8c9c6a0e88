use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_TELEMETRY_CATEGORY: &str = "inpage_provider";

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub negotiation: NegotiationConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NegotiationConfig {
    /// Abort with `NoSupportedScopes` when nothing requested is grantable.
    pub reject_empty_session: bool,
    /// Add approved-but-unrequested supported chains to the optional scopes.
    pub grant_approved_chains: bool,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self { reject_empty_session: true, grant_approved_chains: true }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub category: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: true, category: DEFAULT_TELEMETRY_CATEGORY.to_owned() }
    }
}

impl SessionConfig {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }
}
