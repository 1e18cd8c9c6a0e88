use async_trait::async_trait;
use caip_scope::{ChainScopeId, NetworkConfiguration, SessionGrant};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{AccountApprover, NetworkRegistry, PermissionStore, TelemetrySink};
use crate::error::HostError;
use crate::telemetry::TelemetryEvent;
use crate::types::{AccountApproval, AccountApprovalRequest};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredNetwork {
    pub chain_id: ChainScopeId,
    pub network_client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Wallet state described in TOML, used to seed an [`InMemoryWallet`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalletFixture {
    pub networks: Vec<RegisteredNetwork>,
    pub accounts: Vec<String>,
    pub non_evm_scopes: Vec<ChainScopeId>,
    pub permission_history: Vec<String>,
    pub telemetry_id: Option<String>,
    pub reject_account_approval: bool,
}

impl WalletFixture {
    pub fn from_toml(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    }
}

/// Wallet host backed by process memory.
///
/// Approval auto-accepts: the dapp's account hints are honoured when they
/// name wallet accounts, otherwise every account is approved.
pub struct InMemoryWallet {
    networks: Mutex<Vec<RegisteredNetwork>>,
    accounts: Vec<String>,
    non_evm_scopes: Vec<ChainScopeId>,
    permission_history: Mutex<BTreeSet<String>>,
    grants: Mutex<BTreeMap<String, SessionGrant>>,
    events: Mutex<Vec<TelemetryEvent>>,
    telemetry_id: Option<String>,
    reject_account_approval: bool,
    next_client: AtomicUsize,
}

impl InMemoryWallet {
    pub fn from_fixture(fixture: WalletFixture) -> Self {
        Self {
            networks: Mutex::new(fixture.networks),
            accounts: fixture.accounts,
            non_evm_scopes: fixture.non_evm_scopes,
            permission_history: Mutex::new(fixture.permission_history.into_iter().collect()),
            grants: Mutex::new(BTreeMap::new()),
            events: Mutex::new(Vec::new()),
            telemetry_id: fixture.telemetry_id,
            reject_account_approval: fixture.reject_account_approval,
            next_client: AtomicUsize::new(0),
        }
    }

    pub fn networks(&self) -> Vec<RegisteredNetwork> {
        self.networks.lock().map(|networks| networks.clone()).unwrap_or_default()
    }

    pub fn grant_for(&self, origin: &str) -> Option<SessionGrant> {
        self.grants.lock().ok().and_then(|grants| grants.get(origin).cloned())
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NetworkRegistry for InMemoryWallet {
    fn find_network_client_id(&self, chain: &ChainScopeId) -> Option<String> {
        let networks = self.networks.lock().ok()?;
        networks
            .iter()
            .find(|network| &network.chain_id == chain)
            .map(|network| network.network_client_id.clone())
    }

    fn is_non_evm_scope_supported(&self, chain: &ChainScopeId) -> bool {
        self.non_evm_scopes.contains(chain)
    }

    async fn add_network(&self, config: NetworkConfiguration) -> Result<ChainScopeId, HostError> {
        let mut networks =
            self.networks.lock().map_err(|_| HostError::unavailable("network registry poisoned"))?;
        if networks.iter().any(|network| network.chain_id == config.chain_id) {
            return Err(HostError::failed(format!("{} is already registered", config.chain_id)));
        }
        let index = self.next_client.fetch_add(1, Ordering::Relaxed);
        networks.push(RegisteredNetwork {
            chain_id: config.chain_id.clone(),
            network_client_id: format!("custom-{index}"),
            name: Some(config.name),
        });
        Ok(config.chain_id)
    }

    async fn remove_network(&self, chain: &ChainScopeId) -> Result<(), HostError> {
        let mut networks =
            self.networks.lock().map_err(|_| HostError::unavailable("network registry poisoned"))?;
        let before = networks.len();
        networks.retain(|network| &network.chain_id != chain);
        if networks.len() == before {
            return Err(HostError::failed(format!("{chain} is not registered")));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountApprover for InMemoryWallet {
    async fn request_account_approval(
        &self,
        request: AccountApprovalRequest,
    ) -> Result<AccountApproval, HostError> {
        if self.reject_account_approval {
            return Err(HostError::rejected(format!("user rejected {}", request.origin)));
        }
        let hinted: Vec<&String> = self
            .accounts
            .iter()
            .filter(|account| {
                request.requested_accounts.iter().any(|hint| hint.eq_ignore_ascii_case(account))
            })
            .collect();
        let approved =
            if hinted.is_empty() { self.accounts.iter().collect() } else { hinted };
        Ok(AccountApproval::accounts(approved.into_iter().cloned()))
    }

    fn account_count(&self) -> usize {
        self.accounts.len()
    }
}

#[async_trait]
impl PermissionStore for InMemoryWallet {
    async fn grant_permission(&self, origin: &str, grant: &SessionGrant) -> Result<(), HostError> {
        let mut grants =
            self.grants.lock().map_err(|_| HostError::unavailable("permission store poisoned"))?;
        grants.insert(origin.to_owned(), grant.clone());
        if let Ok(mut history) = self.permission_history.lock() {
            history.insert(origin.to_owned());
        }
        Ok(())
    }

    fn has_permission_history(&self, origin: &str) -> bool {
        self.permission_history.lock().map(|history| history.contains(origin)).unwrap_or(false)
    }
}

impl TelemetrySink for InMemoryWallet {
    fn telemetry_id(&self) -> Option<String> {
        self.telemetry_id.clone()
    }

    fn emit(&self, event: TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
