use caip_scope::{ScopeError, UnsupportedReason};
use serde::{Deserialize, Serialize};

/// JSON-RPC style error codes surfaced to the dapp.
pub mod code {
    pub const INVALID_SESSION_PROPERTIES: i64 = 5302;
    pub const UNSUPPORTED_CHAINS: i64 = 5100;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const USER_REJECTED: i64 = 4001;
    pub const INTERNAL: i64 = -32603;
}

/// Failure reported by a wallet collaborator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum HostError {
    #[error("rejected: {message}")]
    Rejected { message: String },

    #[error("unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("failed: {message}")]
    Failed { message: String },
}

impl HostError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected { message: message.into() }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed { message: message.into() }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Every way a negotiation can end without a grant.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session properties were supplied but empty")]
    InvalidSessionProperties,

    #[error("invalid scope '{scope}': {reason}")]
    InvalidScope { scope: String, reason: String },

    #[error("unsupported scope '{scope}' ({})", reason.as_str())]
    UnsupportedScope { scope: String, reason: UnsupportedReason },

    #[error("none of the requested scopes are supported")]
    NoSupportedScopes,

    #[error("invalid network params: {reason}")]
    InvalidNetworkParams { reason: String },

    #[error("account approval failed: {source}")]
    AccountApproval { source: HostError },

    #[error("permission grant failed: {source}")]
    PermissionGrant { source: HostError },

    #[error("network provisioning for {chain} failed: {source}")]
    NetworkProvisioning { chain: String, source: HostError },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SessionError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidSessionProperties => code::INVALID_SESSION_PROPERTIES,
            Self::UnsupportedScope { .. } | Self::NoSupportedScopes => code::UNSUPPORTED_CHAINS,
            Self::InvalidScope { .. } | Self::InvalidNetworkParams { .. } => code::INVALID_PARAMS,
            Self::AccountApproval { source } if source.is_rejection() => code::USER_REJECTED,
            Self::AccountApproval { .. }
            | Self::PermissionGrant { .. }
            | Self::NetworkProvisioning { .. }
            | Self::Internal { .. } => code::INTERNAL,
        }
    }

    /// Every negotiation error ends the call; none is retried internally.
    pub fn is_terminal(&self) -> bool {
        true
    }

    /// Whether this error can follow network provisioning and so must undo it.
    pub fn triggers_rollback(&self) -> bool {
        match self {
            Self::InvalidSessionProperties
            | Self::InvalidScope { .. }
            | Self::UnsupportedScope { .. }
            | Self::NoSupportedScopes => false,
            Self::InvalidNetworkParams { .. }
            | Self::AccountApproval { .. }
            | Self::PermissionGrant { .. }
            | Self::NetworkProvisioning { .. }
            | Self::Internal { .. } => true,
        }
    }
}

impl From<ScopeError> for SessionError {
    fn from(err: ScopeError) -> Self {
        match err {
            ScopeError::InvalidScope { scope, reason } => Self::InvalidScope { scope, reason },
            ScopeError::UnsupportedScope { scope, reason } => {
                Self::UnsupportedScope { scope, reason }
            }
            ScopeError::InvalidNetworkParams { reason } => Self::InvalidNetworkParams { reason },
            other => Self::internal(other.to_string()),
        }
    }
}
