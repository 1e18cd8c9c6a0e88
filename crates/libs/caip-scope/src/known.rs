use crate::chain::{ChainNamespace, ChainScopeId};
use crate::scope::ScopeObject;

const EIP155_METHODS: &[&str] = &[
    "eth_accounts",
    "eth_blockNumber",
    "eth_call",
    "eth_chainId",
    "eth_estimateGas",
    "eth_feeHistory",
    "eth_gasPrice",
    "eth_getBalance",
    "eth_getBlockByHash",
    "eth_getBlockByNumber",
    "eth_getCode",
    "eth_getLogs",
    "eth_getStorageAt",
    "eth_getTransactionByHash",
    "eth_getTransactionCount",
    "eth_getTransactionReceipt",
    "eth_requestAccounts",
    "eth_sendRawTransaction",
    "eth_sendTransaction",
    "eth_signTypedData_v4",
    "eth_subscribe",
    "eth_unsubscribe",
    "net_version",
    "personal_sign",
    "wallet_switchEthereumChain",
    "wallet_watchAsset",
    "web3_clientVersion",
];

const EIP155_NOTIFICATIONS: &[&str] = &["eth_subscription"];

const WALLET_METHODS: &[&str] =
    &["wallet_getSession", "wallet_invokeMethod", "wallet_revokeSession"];

const WALLET_EIP155_METHODS: &[&str] = &["wallet_addEthereumChain"];

const WALLET_NOTIFICATIONS: &[&str] = &["wallet_sessionChanged", "wallet_notify"];

/// RPC methods the wallet serves for a namespace.
pub fn known_methods(namespace: ChainNamespace) -> &'static [&'static str] {
    match namespace {
        ChainNamespace::Eip155 => EIP155_METHODS,
        ChainNamespace::Wallet => WALLET_METHODS,
        ChainNamespace::Solana | ChainNamespace::Bip122 => &[],
    }
}

/// Methods served on `wallet:<namespace>` scopes.
pub fn known_wallet_namespace_methods(namespace: ChainNamespace) -> &'static [&'static str] {
    match namespace {
        ChainNamespace::Eip155 => WALLET_EIP155_METHODS,
        ChainNamespace::Solana | ChainNamespace::Bip122 | ChainNamespace::Wallet => &[],
    }
}

pub fn known_notifications(namespace: ChainNamespace) -> &'static [&'static str] {
    match namespace {
        ChainNamespace::Eip155 => EIP155_NOTIFICATIONS,
        ChainNamespace::Wallet => WALLET_NOTIFICATIONS,
        ChainNamespace::Solana | ChainNamespace::Bip122 => &[],
    }
}

/// Scope object carrying everything the wallet serves on `chain`, with no accounts.
pub fn known_scope_object(chain: &ChainScopeId) -> ScopeObject {
    let namespace = chain.namespace();
    let wallet_target = match namespace {
        ChainNamespace::Wallet => chain.reference().and_then(ChainNamespace::parse),
        ChainNamespace::Eip155 | ChainNamespace::Solana | ChainNamespace::Bip122 => None,
    };
    match wallet_target {
        Some(target) => ScopeObject::new(
            known_wallet_namespace_methods(target).iter().copied(),
            std::iter::empty::<&str>(),
        ),
        None => ScopeObject::new(
            known_methods(namespace).iter().copied(),
            known_notifications(namespace).iter().copied(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip155_scope_object_lists_rpc_methods_and_subscription() {
        let chain = ChainScopeId::from_eip155_chain_id(1337);
        let scope = known_scope_object(&chain);
        assert!(scope.methods.iter().any(|method| method == "eth_sendTransaction"));
        assert_eq!(scope.notifications, vec!["eth_subscription"]);
        assert!(scope.accounts.is_empty());
    }

    #[test]
    fn wallet_eip155_scope_object_lists_wallet_methods() {
        let chain = ChainScopeId::parse("wallet:eip155").expect("wallet:eip155");
        let scope = known_scope_object(&chain);
        assert_eq!(scope.methods, vec!["wallet_addEthereumChain"]);
        assert!(scope.notifications.is_empty());
    }
}
