use super::*;
use crate::config::NegotiationConfig;
use crate::error::{code, HostError};
use crate::host::{AccountApprover, NetworkRegistry, PermissionStore, TelemetrySink};
use crate::types::AccountApproval;
use async_trait::async_trait;
use caip_scope::{ChainNamespace, NetworkConfiguration, UnsupportedReason};
use serde_json::{json, Value as JsonValue};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const ORIGIN: &str = "https://dapp.example";

struct MockHost {
    registered: Mutex<Vec<ChainScopeId>>,
    supported_answers: Mutex<VecDeque<bool>>,
    failing_adds: Vec<ChainScopeId>,
    non_evm: Vec<ChainScopeId>,
    approval_results: Mutex<VecDeque<Result<AccountApproval, HostError>>>,
    grant_results: Mutex<VecDeque<Result<(), HostError>>>,
    approval_requests: Mutex<Vec<AccountApprovalRequest>>,
    added: Mutex<Vec<ChainScopeId>>,
    removed: Mutex<Vec<ChainScopeId>>,
    granted: Mutex<Vec<SessionGrant>>,
    events: Mutex<Vec<TelemetryEvent>>,
    history: Vec<String>,
    telemetry_id: Option<String>,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
    approval_calls: AtomicUsize,
    grant_calls: AtomicUsize,
}

impl MockHost {
    fn new(registered: &[u64]) -> Self {
        Self {
            registered: Mutex::new(
                registered.iter().copied().map(ChainScopeId::from_eip155_chain_id).collect(),
            ),
            supported_answers: Mutex::new(VecDeque::new()),
            failing_adds: Vec::new(),
            non_evm: Vec::new(),
            approval_results: Mutex::new(VecDeque::new()),
            grant_results: Mutex::new(VecDeque::new()),
            approval_requests: Mutex::new(Vec::new()),
            added: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            granted: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            history: Vec::new(),
            telemetry_id: Some("0xmetrics".to_owned()),
            add_calls: AtomicUsize::new(0),
            remove_calls: AtomicUsize::new(0),
            approval_calls: AtomicUsize::new(0),
            grant_calls: AtomicUsize::new(0),
        }
    }

    fn with_supported_answers(self, answers: Vec<bool>) -> Self {
        *self.supported_answers.lock().expect("supported_answers mutex poisoned") =
            VecDeque::from(answers);
        self
    }

    fn with_failing_add(mut self, chain_id: u64) -> Self {
        self.failing_adds.push(ChainScopeId::from_eip155_chain_id(chain_id));
        self
    }

    fn with_non_evm(mut self, scope: &str) -> Self {
        self.non_evm.push(ChainScopeId::parse(scope).expect("non-evm scope"));
        self
    }

    fn with_approval_results(self, results: Vec<Result<AccountApproval, HostError>>) -> Self {
        *self.approval_results.lock().expect("approval_results mutex poisoned") =
            VecDeque::from(results);
        self
    }

    fn with_grant_results(self, results: Vec<Result<(), HostError>>) -> Self {
        *self.grant_results.lock().expect("grant_results mutex poisoned") = VecDeque::from(results);
        self
    }

    fn with_history(mut self, origin: &str) -> Self {
        self.history.push(origin.to_owned());
        self
    }

    fn without_telemetry_id(mut self) -> Self {
        self.telemetry_id = None;
        self
    }

    fn removed(&self) -> Vec<ChainScopeId> {
        self.removed.lock().expect("removed mutex poisoned").clone()
    }

    fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().expect("events mutex poisoned").clone()
    }
}

#[async_trait]
impl NetworkRegistry for MockHost {
    fn find_network_client_id(&self, chain: &ChainScopeId) -> Option<String> {
        let registered = self.registered.lock().expect("registered mutex poisoned");
        registered.contains(chain).then(|| format!("client-{chain}"))
    }

    fn is_chain_id_supported(&self, chain: &ChainScopeId) -> bool {
        let queued =
            self.supported_answers.lock().expect("supported_answers mutex poisoned").pop_front();
        if let Some(answer) = queued {
            return answer;
        }
        match chain.namespace() {
            ChainNamespace::Wallet => true,
            ChainNamespace::Eip155 => self.find_network_client_id(chain).is_some(),
            ChainNamespace::Solana | ChainNamespace::Bip122 => self.non_evm.contains(chain),
        }
    }

    async fn add_network(&self, config: NetworkConfiguration) -> Result<ChainScopeId, HostError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_adds.contains(&config.chain_id) {
            return Err(HostError::failed(format!("cannot reach {}", config.chain_id)));
        }
        self.registered.lock().expect("registered mutex poisoned").push(config.chain_id.clone());
        self.added.lock().expect("added mutex poisoned").push(config.chain_id.clone());
        Ok(config.chain_id)
    }

    async fn remove_network(&self, chain: &ChainScopeId) -> Result<(), HostError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.registered.lock().expect("registered mutex poisoned").retain(|known| known != chain);
        self.removed.lock().expect("removed mutex poisoned").push(chain.clone());
        Ok(())
    }
}

#[async_trait]
impl AccountApprover for MockHost {
    async fn request_account_approval(
        &self,
        request: AccountApprovalRequest,
    ) -> Result<AccountApproval, HostError> {
        self.approval_calls.fetch_add(1, Ordering::SeqCst);
        self.approval_requests.lock().expect("approval_requests mutex poisoned").push(request);
        self.approval_results
            .lock()
            .expect("approval_results mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(AccountApproval::accounts(["0xaaa", "0xbbb"])))
    }

    fn account_count(&self) -> usize {
        3
    }
}

#[async_trait]
impl PermissionStore for MockHost {
    async fn grant_permission(&self, _origin: &str, grant: &SessionGrant) -> Result<(), HostError> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        let result =
            self.grant_results.lock().expect("grant_results mutex poisoned").pop_front();
        if let Some(Err(err)) = result {
            return Err(err);
        }
        self.granted.lock().expect("granted mutex poisoned").push(grant.clone());
        Ok(())
    }

    fn has_permission_history(&self, origin: &str) -> bool {
        self.history.iter().any(|known| known == origin)
    }
}

impl TelemetrySink for MockHost {
    fn telemetry_id(&self) -> Option<String> {
        self.telemetry_id.clone()
    }

    fn emit(&self, event: TelemetryEvent) {
        self.events.lock().expect("events mutex poisoned").push(event);
    }
}

fn orchestrator(host: &Arc<MockHost>) -> SessionGrantOrchestrator {
    SessionGrantOrchestrator::new(host.clone(), SessionConfig::default())
}

fn request(value: JsonValue) -> NegotiationRequest {
    let mut value = value;
    value["origin"] = json!(ORIGIN);
    serde_json::from_value(value).expect("request")
}

fn eip3085(chain_id: u64) -> JsonValue {
    json!({
        "eip3085": {
            "chainId": format!("{chain_id:#x}"),
            "chainName": format!("Chain {chain_id}"),
            "rpcUrls": [format!("https://rpc-{chain_id}.example")],
            "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 }
        }
    })
}

fn chain(chain_id: u64) -> ChainScopeId {
    ChainScopeId::from_eip155_chain_id(chain_id)
}

fn addresses(scopes: &ScopeMap, chain: &ChainScopeId) -> Vec<String> {
    scopes
        .get(chain)
        .map(|scope| scope.accounts.iter().map(|account| account.address().to_owned()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn empty_session_properties_fail_before_any_other_validation() {
    let host = Arc::new(MockHost::new(&[1]));
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "cosmos:hub": { "methods": [] } },
            "sessionProperties": {}
        })))
        .await
        .expect_err("empty session properties");

    assert_eq!(err, SessionError::InvalidSessionProperties);
    assert_eq!(err.code(), code::INVALID_SESSION_PROPERTIES);
    assert_eq!(host.approval_calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.grant_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn approved_accounts_replace_requested_accounts() {
    let host = Arc::new(MockHost::new(&[1]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": {
                "eip155:1": {
                    "methods": ["eth_chainId"],
                    "accounts": ["eip155:1:0x1", "eip155:1:0x2"]
                }
            }
        })))
        .await
        .expect("negotiated");

    assert_eq!(addresses(&result.session_scopes, &chain(1)), vec!["0xaaa", "0xbbb"]);
    assert!(result.grant.is_multichain_origin);
    assert!(result.provisioned_chains.is_empty());

    let requests = host.approval_requests.lock().expect("approval_requests mutex poisoned");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].chain_ids, vec![chain(1)]);
    assert_eq!(requests[0].requested_accounts, vec!["0x1", "0x2"]);
}

#[tokio::test]
async fn provisioned_chain_is_removed_once_when_grant_fails() {
    let host = Arc::new(
        MockHost::new(&[1])
            .with_grant_results(vec![Err(HostError::unavailable("permission store locked"))]),
    );
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:5": { "methods": ["eth_chainId"] } },
            "scopedProperties": { "eip155:5": eip3085(5) }
        })))
        .await
        .expect_err("grant failure");

    assert!(matches!(err, SessionError::PermissionGrant { .. }));
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.remove_calls.load(Ordering::SeqCst), 1);
    assert_eq!(host.removed(), vec![chain(5)]);
    assert!(host.find_network_client_id(&chain(5)).is_none());
}

#[tokio::test]
async fn successful_provisioning_is_reported_and_kept() {
    let host = Arc::new(MockHost::new(&[1]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } },
            "optionalScopes": { "eip155:5": { "methods": ["eth_call"] } },
            "scopedProperties": { "eip155:5": eip3085(5) }
        })))
        .await
        .expect("negotiated");

    assert_eq!(result.provisioned_chains, vec![chain(5)]);
    let keys: Vec<_> = result.session_scopes.keys().cloned().collect();
    assert_eq!(keys, vec![chain(1), chain(5)]);
    assert!(result.grant.optional_scopes.contains_key(&chain(5)));
    assert_eq!(host.remove_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partial_provisioning_failure_rolls_back_only_added_chains() {
    let host = Arc::new(MockHost::new(&[]).with_failing_add(10));
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": {
                "eip155": { "references": ["5", "10"], "methods": ["eth_chainId"] }
            },
            "scopedProperties": {
                "eip155:5": eip3085(5),
                "eip155:10": eip3085(10)
            }
        })))
        .await
        .expect_err("provisioning failure");

    assert_eq!(
        err,
        SessionError::NetworkProvisioning {
            chain: "eip155:10".to_owned(),
            source: HostError::failed("cannot reach eip155:10"),
        }
    );
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 2);
    assert_eq!(host.removed(), vec![chain(5)]);
    assert_eq!(host.grant_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn already_served_chain_with_property_is_not_provisioned() {
    let host = Arc::new(MockHost::new(&[5]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:5": { "methods": ["eth_chainId"] } },
            "scopedProperties": { "eip155:5": eip3085(5) }
        })))
        .await
        .expect("negotiated");

    assert!(result.provisioned_chains.is_empty());
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsupported_required_scope_aborts_without_side_effects() {
    let host = Arc::new(MockHost::new(&[1]));
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": {
                "eip155:1": { "methods": ["eth_chainId"] },
                "eip155:99": { "methods": ["eth_chainId"] }
            }
        })))
        .await
        .expect_err("unsupported");

    assert_eq!(
        err,
        SessionError::UnsupportedScope {
            scope: "eip155:99".to_owned(),
            reason: UnsupportedReason::NotSupported,
        }
    );
    assert_eq!(err.code(), code::UNSUPPORTED_CHAINS);
    assert_eq!(host.approval_calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn capability_flip_between_passes_is_fatal() {
    let host = Arc::new(MockHost::new(&[]).with_supported_answers(vec![false, true]));
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } }
        })))
        .await
        .expect_err("inconsistent capability state");

    assert_eq!(
        err,
        SessionError::UnsupportedScope {
            scope: "eip155:1".to_owned(),
            reason: UnsupportedReason::InconsistentCapabilityState,
        }
    );
    assert_eq!(host.approval_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn invalid_scoped_property_leaves_chain_unsupportable() {
    let host = Arc::new(MockHost::new(&[1]));
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:5": { "methods": ["eth_chainId"] } },
            "scopedProperties": { "eip155:5": eip3085(6) }
        })))
        .await
        .expect_err("payload for the wrong chain");

    assert!(matches!(err, SessionError::UnsupportedScope { ref scope, .. } if scope == "eip155:5"));
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsupported_optional_scopes_are_dropped() {
    let host = Arc::new(MockHost::new(&[1]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } },
            "optionalScopes": {
                "eip155:99": { "methods": ["eth_call"] },
                "wallet": { "methods": ["wallet_getSession"] }
            }
        })))
        .await
        .expect("negotiated");

    let keys: Vec<String> = result.session_scopes.keys().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["eip155:1", "wallet"]);
    let wallet = result.session_scopes.get(&ChainScopeId::wallet()).expect("wallet");
    assert!(wallet.accounts.is_empty());
}

#[tokio::test]
async fn nothing_grantable_is_rejected_unless_configured_otherwise() {
    let scopes = json!({ "optionalScopes": { "eip155:99": { "methods": ["eth_call"] } } });

    let host = Arc::new(MockHost::new(&[1]));
    let err = orchestrator(&host).negotiate(request(scopes.clone())).await.expect_err("empty");
    assert_eq!(err, SessionError::NoSupportedScopes);

    let config = SessionConfig {
        negotiation: NegotiationConfig { reject_empty_session: false, ..Default::default() },
        ..Default::default()
    };
    let lenient = SessionGrantOrchestrator::new(host.clone(), config);
    let result = lenient.negotiate(request(scopes)).await.expect("empty grant");
    assert!(result.session_scopes.is_empty());
}

#[tokio::test]
async fn rejected_approval_rolls_back_nothing_and_reports_user_rejection() {
    let host = Arc::new(
        MockHost::new(&[1]).with_approval_results(vec![Err(HostError::rejected("closed popup"))]),
    );
    let err = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } }
        })))
        .await
        .expect_err("rejected");

    assert!(matches!(err, SessionError::AccountApproval { .. }));
    assert_eq!(err.code(), code::USER_REJECTED);
    assert_eq!(host.grant_calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.remove_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn previous_grant_is_merged_underneath() {
    let host = Arc::new(MockHost::new(&[1, 137]));
    let first = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:137": { "methods": ["personal_sign"] } }
        })))
        .await
        .expect("first negotiation");

    let mut second = request(json!({
        "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } }
    }));
    second.previous_grant = Some(first.grant);
    let result = orchestrator(&host).negotiate(second).await.expect("second negotiation");

    let keys: Vec<_> = result.grant.required_scopes.keys().cloned().collect();
    assert_eq!(keys, vec![chain(137), chain(1)]);
    assert_eq!(
        result.session_scopes.get(&chain(137)).expect("polygon").methods,
        vec!["personal_sign"]
    );
}

#[tokio::test]
async fn approved_chains_join_the_optional_scopes() {
    let host = Arc::new(MockHost::new(&[1, 10]).with_approval_results(vec![Ok(
        AccountApproval::accounts(["0xaaa"]).with_chain_ids(vec![chain(1), chain(10), chain(99)]),
    )]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } }
        })))
        .await
        .expect("negotiated");

    let optimism = result.grant.optional_scopes.get(&chain(10)).expect("optimism added");
    assert!(optimism.methods.iter().any(|method| method == "eth_sendTransaction"));
    assert_eq!(addresses(&result.grant.optional_scopes, &chain(10)), vec!["0xaaa"]);
    assert!(!result.session_scopes.contains_key(&chain(99)));
}

#[tokio::test]
async fn session_properties_are_returned_unchanged() {
    let host = Arc::new(MockHost::new(&[1]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } },
            "sessionProperties": { "expiry": "2026-12-31", "nested": { "a": 1 } }
        })))
        .await
        .expect("negotiated");

    assert_eq!(result.session_properties["expiry"], "2026-12-31");
    assert_eq!(result.grant.session_properties["nested"], json!({ "a": 1 }));
    let granted = host.granted.lock().expect("granted mutex poisoned");
    assert_eq!(granted.as_slice(), [result.grant.clone()]);
}

#[tokio::test]
async fn dapp_viewed_reports_first_visit_and_connected_accounts() {
    let host = Arc::new(MockHost::new(&[1]));
    orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } }
        })))
        .await
        .expect("negotiated");

    let events = host.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event, "Dapp Viewed");
    assert_eq!(events[0].referrer, ORIGIN);
    assert_eq!(
        events[0].properties,
        DappViewedProperties {
            is_first_visit: true,
            number_of_accounts: 3,
            number_of_accounts_connected: 2,
        }
    );
}

#[tokio::test]
async fn telemetry_respects_history_opt_out_and_config() {
    let returning = Arc::new(MockHost::new(&[1]).with_history(ORIGIN));
    let scopes = json!({ "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } } });
    orchestrator(&returning).negotiate(request(scopes.clone())).await.expect("negotiated");
    assert!(!returning.events()[0].properties.is_first_visit);

    let opted_out = Arc::new(MockHost::new(&[1]).without_telemetry_id());
    orchestrator(&opted_out).negotiate(request(scopes.clone())).await.expect("negotiated");
    assert!(opted_out.events().is_empty());

    let host = Arc::new(MockHost::new(&[1]));
    let mut config = SessionConfig::default();
    config.telemetry.enabled = false;
    SessionGrantOrchestrator::new(host.clone(), config)
        .negotiate(request(scopes))
        .await
        .expect("negotiated");
    assert!(host.events().is_empty());
}

const SOLANA_MAINNET: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";
const SOLANA_ADDRESS: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

#[tokio::test]
async fn approved_accounts_bind_to_their_own_namespace() {
    let solana = ChainScopeId::parse(SOLANA_MAINNET).expect("solana");
    let solana_account = format!("{SOLANA_MAINNET}:{SOLANA_ADDRESS}");
    let host = Arc::new(
        MockHost::new(&[1])
            .with_non_evm(SOLANA_MAINNET)
            .with_approval_results(vec![Ok(AccountApproval::accounts([
                "0xaaa".to_owned(),
                solana_account.clone(),
            ]))]),
    );
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": {
                "eip155:1": { "methods": ["eth_chainId"] },
                SOLANA_MAINNET: {
                    "methods": ["signMessage"],
                    "accounts": [solana_account.clone()]
                }
            }
        })))
        .await
        .expect("negotiated");

    assert_eq!(addresses(&result.session_scopes, &chain(1)), vec!["0xaaa"]);
    assert_eq!(addresses(&result.session_scopes, &solana), vec![SOLANA_ADDRESS]);
    let requests = host.approval_requests.lock().expect("approval_requests mutex poisoned");
    assert_eq!(requests[0].requested_accounts, vec![solana_account]);
}

#[tokio::test]
async fn evm_only_approval_leaves_solana_scope_without_accounts() {
    let solana = ChainScopeId::parse(SOLANA_MAINNET).expect("solana");
    let host = Arc::new(MockHost::new(&[1]).with_non_evm(SOLANA_MAINNET));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": {
                "eip155:1": { "methods": ["eth_chainId"] },
                SOLANA_MAINNET: { "methods": ["signMessage"] }
            }
        })))
        .await
        .expect("negotiated");

    assert_eq!(addresses(&result.session_scopes, &chain(1)), vec!["0xaaa", "0xbbb"]);
    assert!(addresses(&result.session_scopes, &solana).is_empty());
}

#[tokio::test]
async fn aliased_scoped_property_keys_provision_the_validated_payload() {
    let host = Arc::new(MockHost::new(&[1]));
    let result = orchestrator(&host)
        .negotiate(request(json!({
            "requiredScopes": { "eip155:5": { "methods": ["eth_chainId"] } },
            "scopedProperties": {
                "eip155:05": { "eip3085": { "chainId": "0x5" } },
                "eip155:5": eip3085(5)
            }
        })))
        .await
        .expect("negotiated");

    assert_eq!(result.provisioned_chains, vec![chain(5)]);
    assert_eq!(host.add_calls.load(Ordering::SeqCst), 1);
}
