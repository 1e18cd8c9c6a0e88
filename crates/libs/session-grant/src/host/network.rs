use async_trait::async_trait;
use caip_scope::{ChainNamespace, ChainScopeId, NetworkConfiguration};

use crate::error::HostError;

/// The wallet's registry of chains it can serve.
#[async_trait]
pub trait NetworkRegistry: Send + Sync {
    /// Network client already serving `chain`, if any. Only meaningful for
    /// `eip155` chains.
    fn find_network_client_id(&self, chain: &ChainScopeId) -> Option<String>;

    /// Whether a non-EVM account provider serves `chain`.
    fn is_non_evm_scope_supported(&self, _chain: &ChainScopeId) -> bool {
        false
    }

    /// Whether requests on `chain` can be served right now.
    fn is_chain_id_supported(&self, chain: &ChainScopeId) -> bool {
        match chain.namespace() {
            ChainNamespace::Eip155 => self.find_network_client_id(chain).is_some(),
            ChainNamespace::Wallet => true,
            ChainNamespace::Solana | ChainNamespace::Bip122 => {
                self.is_non_evm_scope_supported(chain)
            }
        }
    }

    /// Registers a new network and returns the chain it serves.
    async fn add_network(&self, config: NetworkConfiguration) -> Result<ChainScopeId, HostError>;

    /// Removes a network previously added by [`add_network`](Self::add_network).
    async fn remove_network(&self, chain: &ChainScopeId) -> Result<(), HostError>;
}
