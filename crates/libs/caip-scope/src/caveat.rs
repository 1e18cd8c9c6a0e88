use crate::chain::{ChainNamespace, ChainScopeId};
use crate::error::{ScopeError, UnsupportedReason};
use crate::scope::{ScopeMap, ScopeObject};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The permission record handed to the permission store.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    #[serde(default)]
    pub required_scopes: ScopeMap,
    #[serde(default)]
    pub optional_scopes: ScopeMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub session_properties: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub is_multichain_origin: bool,
}

impl SessionGrant {
    pub fn scopes(&self) -> impl Iterator<Item = (&ChainScopeId, &ScopeObject)> {
        self.required_scopes.iter().chain(self.optional_scopes.iter())
    }

    /// Distinct account addresses across every scope, first-seen order.
    pub fn account_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = Vec::new();
        for (_, scope) in self.scopes() {
            for account in &scope.accounts {
                if !addresses.iter().any(|known| account.matches_address(known)) {
                    addresses.push(account.address().to_owned());
                }
            }
        }
        addresses
    }
}

/// Outcome of editing an existing grant.
#[derive(Clone, Debug, PartialEq)]
pub enum CaveatMutation {
    Noop,
    UpdateValue(SessionGrant),
    RevokePermission,
}

/// Drops `chain` from a grant.
///
/// Losing a required scope invalidates the whole grant.
pub fn remove_scope(grant: &SessionGrant, chain: &ChainScopeId) -> CaveatMutation {
    if grant.required_scopes.contains_key(chain) {
        return CaveatMutation::RevokePermission;
    }
    if !grant.optional_scopes.contains_key(chain) {
        return CaveatMutation::Noop;
    }
    let mut updated = grant.clone();
    updated.optional_scopes.remove(chain);
    CaveatMutation::UpdateValue(updated)
}

/// Drops `address` from every scope of a grant.
///
/// A grant left without any account is revoked.
pub fn remove_account(grant: &SessionGrant, address: &str) -> CaveatMutation {
    let mut updated = grant.clone();
    let mut removed = false;
    let scopes = updated.required_scopes.values_mut().chain(updated.optional_scopes.values_mut());
    for scope in scopes {
        let before = scope.accounts.len();
        scope.accounts.retain(|account| !account.matches_address(address));
        removed |= scope.accounts.len() != before;
    }
    if !removed {
        return CaveatMutation::Noop;
    }
    if updated.account_addresses().is_empty() {
        return CaveatMutation::RevokePermission;
    }
    CaveatMutation::UpdateValue(updated)
}

/// Checks a stored grant before it is trusted again.
///
/// Every scope must be flattened (accounts bound to their own chain, no
/// empty names) and served by the wallet.
pub fn validate_session_grant<S>(
    grant: &SessionGrant,
    mut is_supported: S,
) -> Result<(), ScopeError>
where
    S: FnMut(&ChainScopeId) -> bool,
{
    for (chain, scope) in grant.scopes() {
        if scope.methods.iter().chain(&scope.notifications).any(|name| name.trim().is_empty()) {
            return Err(ScopeError::invalid_caveat(format!(
                "scope {chain} has an empty method or notification name"
            )));
        }
        let misbound = scope.accounts.iter().find(|account| !account_fits(chain, account.chain()));
        if let Some(account) = misbound {
            return Err(ScopeError::invalid_caveat(format!(
                "account {account} is not bound to scope {chain}"
            )));
        }
        if !is_supported(chain) {
            return Err(ScopeError::UnsupportedScope {
                scope: chain.to_string(),
                reason: UnsupportedReason::NotSupported,
            });
        }
    }
    Ok(())
}

fn account_fits(scope: &ChainScopeId, account_chain: &ChainScopeId) -> bool {
    match scope.namespace() {
        ChainNamespace::Wallet => scope.reference().is_some() && scope == account_chain,
        ChainNamespace::Eip155 | ChainNamespace::Solana | ChainNamespace::Bip122 => {
            scope == account_chain
        }
    }
}
