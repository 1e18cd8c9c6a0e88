use serde::{Deserialize, Serialize};

/// Why a scope ended up rejected by the support assertion.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// Neither registered nor provisionable.
    NotSupported,
    /// Bucketed as unsupportable but reported as supported on re-check.
    InconsistentCapabilityState,
}

impl UnsupportedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotSupported => "not_supported",
            Self::InconsistentCapabilityState => "inconsistent_capability_state",
        }
    }
}

/// Failures raised by the pure scope algebra.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ScopeError {
    #[error("invalid scope '{scope}': {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("unsupported scope '{scope}' ({})", reason.as_str())]
    UnsupportedScope { scope: String, reason: UnsupportedReason },

    #[error("invalid network params: {reason}")]
    InvalidNetworkParams { reason: String },

    #[error("invalid caveat: {reason}")]
    InvalidCaveat { reason: String },
}

impl ScopeError {
    pub fn invalid_scope(scope: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidScope { scope: scope.into(), reason: reason.into() }
    }

    pub fn invalid_network_params(reason: impl Into<String>) -> Self {
        Self::InvalidNetworkParams { reason: reason.into() }
    }

    pub fn invalid_caveat(reason: impl Into<String>) -> Self {
        Self::InvalidCaveat { reason: reason.into() }
    }
}
