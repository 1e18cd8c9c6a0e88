//! Multichain session negotiation on top of `caip-scope`.
//!
//! [`SessionGrantOrchestrator`] drives one request through flattening,
//! bucketing, account approval, network provisioning and the final grant,
//! talking to the wallet only through the traits in [`host`].

mod config;
mod error;
pub mod host;
mod ledger;
mod lifecycle;
mod orchestrator;
mod provision;
mod telemetry;
mod types;

pub use config::{NegotiationConfig, SessionConfig, TelemetryConfig, DEFAULT_TELEMETRY_CATEGORY};
pub use error::{code, HostError, SessionError};
pub use host::{InMemoryWallet, WalletFixture, WalletHost};
pub use ledger::ProvisionedChainLedger;
pub use lifecycle::{NegotiationLifecycle, NegotiationStage};
pub use orchestrator::SessionGrantOrchestrator;
pub use provision::{add_network_if_missing, validate_and_add_eip3085};
pub use telemetry::{DappViewedProperties, TelemetryEvent, DAPP_VIEWED};
pub use types::{AccountApproval, AccountApprovalRequest, NegotiationRequest, NegotiationResult};
