mod accounts;
mod memory;
mod network;
mod permissions;
mod telemetry;

pub use accounts::AccountApprover;
pub use memory::{InMemoryWallet, RegisteredNetwork, WalletFixture};
pub use network::NetworkRegistry;
pub use permissions::PermissionStore;
pub use telemetry::TelemetrySink;

/// Every capability the negotiation consumes from the wallet.
///
/// Automatically implemented for any type that implements all four
/// sub-traits. Use `Arc<dyn WalletHost>` as the handle type.
pub trait WalletHost: NetworkRegistry + AccountApprover + PermissionStore + TelemetrySink {}

impl<T> WalletHost for T where
    T: NetworkRegistry + AccountApprover + PermissionStore + TelemetrySink
{
}
