use crate::chain::{AccountId, ChainNamespace, ChainScopeId};
use crate::scope::{push_unique, ScopeMap};

/// Replaces every scope's accounts with the approved accounts of its own
/// namespace.
///
/// An approved entry is either a CAIP-10 account id or a bare address.
/// Bare addresses are EVM addresses and bind to `eip155` scopes (and
/// `wallet:eip155`). EVM account ids bind to every `eip155` chain; other
/// account ids bind only to their exact chain (or the matching `wallet:`
/// scope). Whatever accounts the dapp asked for are discarded, and the bare
/// `wallet` scope ends up with no accounts.
pub fn assign_accounts_to_scopes<A: AsRef<str>>(scopes: &mut ScopeMap, approved: &[A]) {
    for (chain, scope) in scopes.iter_mut() {
        scope.accounts.clear();
        if chain.reference().is_none() {
            continue;
        }
        for entry in approved {
            if let Some(account) = bind_account(chain, entry.as_ref()) {
                push_unique(&mut scope.accounts, account);
            }
        }
    }
}

/// Namespace whose addresses a scope holds; `wallet:<ns>` holds `<ns>`.
fn account_namespace(chain: &ChainScopeId) -> Option<&str> {
    match chain.namespace() {
        ChainNamespace::Wallet => chain.reference(),
        ChainNamespace::Eip155 | ChainNamespace::Solana | ChainNamespace::Bip122 => {
            Some(chain.namespace().as_str())
        }
    }
}

fn bind_account(chain: &ChainScopeId, entry: &str) -> Option<AccountId> {
    let scope_namespace = account_namespace(chain)?;
    let address = if entry.contains(':') {
        let account = match AccountId::parse(entry) {
            Ok(account) => account,
            Err(err) => {
                log::warn!("skipping malformed approved account '{entry}': {err}");
                return None;
            }
        };
        let owner = account.chain();
        if account_namespace(owner) != Some(scope_namespace) {
            return None;
        }
        let same_chain = owner == chain
            || owner.namespace() == ChainNamespace::Eip155
            || chain.namespace() == ChainNamespace::Wallet;
        if !same_chain {
            return None;
        }
        account.address().to_owned()
    } else if scope_namespace == ChainNamespace::Eip155.as_str() {
        entry.to_owned()
    } else {
        return None;
    };

    match AccountId::new(chain.clone(), &address) {
        Ok(account) => Some(account),
        Err(err) => {
            log::warn!("skipping approved account for {chain}: {err}");
            None
        }
    }
}
