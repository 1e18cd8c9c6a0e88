use caip_scope::ChainScopeId;

use crate::host::NetworkRegistry;

/// Chains added to the wallet during one negotiation call.
///
/// Dropped with the call: committed on success, rolled back on failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProvisionedChainLedger {
    chains: Vec<ChainScopeId>,
}

impl ProvisionedChainLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, chain: ChainScopeId) {
        log::info!("provisioned network for {chain}");
        self.chains.push(chain);
    }

    pub fn chains(&self) -> &[ChainScopeId] {
        &self.chains
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Keeps every provisioned chain and hands the list back.
    pub fn commit(self) -> Vec<ChainScopeId> {
        self.chains
    }

    /// Removes every recorded chain, in the order they were added.
    ///
    /// Removal failures are logged and skipped. Returns how many chains
    /// could not be removed.
    pub async fn rollback<R>(self, registry: &R) -> usize
    where
        R: NetworkRegistry + ?Sized,
    {
        let mut failures = 0;
        for chain in self.chains {
            match registry.remove_network(&chain).await {
                Ok(()) => log::debug!("rolled back provisioned network {chain}"),
                Err(err) => {
                    failures += 1;
                    log::warn!("failed to roll back provisioned network {chain}: {err}");
                }
            }
        }
        failures
    }
}
