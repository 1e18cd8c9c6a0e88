use caip_scope::{
    assert_scopes_supported, assign_accounts_to_scopes, bucket_scopes, is_chain_id_supportable,
    known_scope_object, merge_scopes, process_scoped_properties, validate_and_flatten_scopes,
    validate_scoped_property_eip3085, ChainNamespace, ChainScopeId, Eip3085Params, ScopeBuckets,
    ScopeMap, ScopedProperties, SessionGrant,
};
use futures::future::join_all;
use serde_json::Map as JsonMap;
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::host::WalletHost;
use crate::ledger::ProvisionedChainLedger;
use crate::lifecycle::NegotiationLifecycle;
use crate::provision::add_network_if_missing;
use crate::telemetry::{DappViewedProperties, TelemetryEvent};
use crate::types::{AccountApprovalRequest, NegotiationRequest, NegotiationResult};

/// Runs one session negotiation per request against a wallet host.
///
/// Chains provisioned during a call that later fails are removed again
/// before the error is returned.
pub struct SessionGrantOrchestrator {
    host: Arc<dyn WalletHost>,
    config: SessionConfig,
}

impl SessionGrantOrchestrator {
    pub fn new(host: Arc<dyn WalletHost>, config: SessionConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn negotiate(
        &self,
        request: NegotiationRequest,
    ) -> Result<NegotiationResult, SessionError> {
        let mut lifecycle = NegotiationLifecycle::default();
        let mut ledger = ProvisionedChainLedger::new();

        let err = match self.run(&request, &mut lifecycle, &mut ledger).await {
            Ok(result) => return Ok(result),
            Err(err) => err,
        };

        let stage = lifecycle.stage();
        if let Err(lifecycle_err) = lifecycle.mark_aborted() {
            log::warn!("{lifecycle_err}");
        }
        log::warn!(
            "session negotiation for {} aborted at {} (code {}): {err}",
            request.origin,
            stage.as_str(),
            err.code()
        );
        if !ledger.is_empty() {
            let attempted = ledger.len();
            let failures = ledger.rollback(self.host.as_ref()).await;
            if failures > 0 {
                log::warn!("{failures} of {attempted} provisioned networks could not be removed");
            }
        }
        Err(err)
    }

    async fn run(
        &self,
        request: &NegotiationRequest,
        lifecycle: &mut NegotiationLifecycle,
        ledger: &mut ProvisionedChainLedger,
    ) -> Result<NegotiationResult, SessionError> {
        if request.session_properties.as_ref().is_some_and(JsonMap::is_empty) {
            return Err(SessionError::InvalidSessionProperties);
        }

        let (required, optional) =
            validate_and_flatten_scopes(&request.required_scopes, &request.optional_scopes)?;
        lifecycle.mark_scopes_flattened()?;

        let scoped_properties = process_scoped_properties(
            &required,
            &optional,
            request.scoped_properties.as_ref(),
            validate_scoped_property_eip3085,
        );
        lifecycle.mark_properties_processed()?;

        let host = self.host.as_ref();
        let is_supported = |chain: &ChainScopeId| host.is_chain_id_supported(chain);
        let is_supportable =
            |chain: &ChainScopeId| is_chain_id_supportable(&scoped_properties, chain);
        let required_buckets = bucket_scopes(&required, is_supported, is_supportable);
        let optional_buckets = bucket_scopes(&optional, is_supported, is_supportable);

        assert_scopes_supported(&required_buckets.unsupportable, is_supported)?;
        for chain in optional_buckets.unsupportable.keys() {
            log::debug!("dropping unsupported optional scope {chain}");
        }
        if self.config.negotiation.reject_empty_session
            && !required_buckets.has_grantable()
            && !optional_buckets.has_grantable()
        {
            return Err(SessionError::NoSupportedScopes);
        }
        lifecycle.mark_bucketed()?;

        let ScopeBuckets {
            supported: mut supported_required,
            supportable: mut supportable_required,
            ..
        } = required_buckets;
        let ScopeBuckets {
            supported: mut supported_optional,
            supportable: mut supportable_optional,
            ..
        } = optional_buckets;

        let candidates: Vec<ChainScopeId> = merge_scopes(
            &merge_scopes(&supported_required, &supportable_required),
            &merge_scopes(&supported_optional, &supportable_optional),
        )
        .keys()
        .cloned()
        .collect();
        let approval = host
            .request_account_approval(AccountApprovalRequest {
                origin: request.origin.clone(),
                chain_ids: candidates.clone(),
                requested_accounts: requested_addresses(&required, &optional),
            })
            .await
            .map_err(|source| SessionError::AccountApproval { source })?;

        if self.config.negotiation.grant_approved_chains {
            for chain in approval.chain_ids.iter().flatten() {
                if !candidates.contains(chain) && is_supported(chain) {
                    log::debug!("adding approved chain {chain} to optional scopes");
                    supported_optional.insert(chain.clone(), known_scope_object(chain));
                }
            }
        }
        for scopes in [
            &mut supported_required,
            &mut supportable_required,
            &mut supported_optional,
            &mut supportable_optional,
        ] {
            assign_accounts_to_scopes(scopes, &approval.accounts);
        }
        lifecycle.mark_accounts_assigned()?;

        let mut granted_required = merge_scopes(&supported_required, &supportable_required);
        let mut granted_optional = merge_scopes(&supported_optional, &supportable_optional);
        if let Some(previous) = &request.previous_grant {
            granted_required = merge_scopes(&previous.required_scopes, &granted_required);
            granted_optional = merge_scopes(&previous.optional_scopes, &granted_optional);
        }
        let session_scopes = merge_scopes(&granted_required, &granted_optional);

        self.provision_networks(&session_scopes, &scoped_properties, ledger).await?;
        lifecycle.mark_networks_provisioned()?;

        let is_first_visit = !host.has_permission_history(&request.origin);
        let session_properties = request.session_properties.clone().unwrap_or_default();
        let grant = SessionGrant {
            required_scopes: granted_required,
            optional_scopes: granted_optional,
            session_properties: session_properties
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
            is_multichain_origin: true,
        };
        host.grant_permission(&request.origin, &grant)
            .await
            .map_err(|source| SessionError::PermissionGrant { source })?;
        lifecycle.mark_permission_granted()?;
        log::info!("granted {} scopes to {}", session_scopes.len(), request.origin);

        self.emit_dapp_viewed(&request.origin, is_first_visit, &grant);

        Ok(NegotiationResult {
            session_scopes,
            session_properties,
            grant,
            provisioned_chains: std::mem::take(ledger).commit(),
        })
    }

    /// Provisions every granted chain that carries a validated EIP-3085
    /// property, concurrently.
    ///
    /// All calls finish before any failure is reported, and every chain
    /// that was added lands in `ledger` first.
    async fn provision_networks(
        &self,
        session_scopes: &ScopeMap,
        scoped_properties: &ScopedProperties,
        ledger: &mut ProvisionedChainLedger,
    ) -> Result<(), SessionError> {
        let targets: Vec<(&ChainScopeId, &Eip3085Params)> = session_scopes
            .keys()
            .filter_map(|chain| {
                let params = scoped_properties.get(chain)?.eip3085.as_ref()?;
                Some((chain, params))
            })
            .collect();
        if targets.is_empty() {
            return Ok(());
        }

        let host = self.host.as_ref();
        let outcomes = join_all(
            targets.iter().map(|(chain, params)| add_network_if_missing(host, chain, params)),
        )
        .await;

        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Some(chain)) => ledger.record(chain),
                Ok(None) => {}
                Err(err) if first_error.is_none() => first_error = Some(err),
                Err(err) => log::warn!("additional provisioning failure: {err}"),
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn emit_dapp_viewed(&self, origin: &str, is_first_visit: bool, grant: &SessionGrant) {
        if !self.config.telemetry.enabled || self.host.telemetry_id().is_none() {
            return;
        }
        let properties = DappViewedProperties {
            is_first_visit,
            number_of_accounts: self.host.account_count(),
            number_of_accounts_connected: grant.account_addresses().len(),
        };
        self.host.emit(TelemetryEvent::dapp_viewed(
            self.config.telemetry.category.clone(),
            origin,
            properties,
        ));
    }
}

/// Distinct accounts the dapp listed in its requested scopes.
///
/// EVM accounts are hinted by bare address, every other namespace by its
/// full CAIP-10 id.
fn requested_addresses(required: &ScopeMap, optional: &ScopeMap) -> Vec<String> {
    let mut addresses: Vec<String> = Vec::new();
    for scope in required.values().chain(optional.values()) {
        for account in &scope.accounts {
            let hint = match account.chain().namespace() {
                ChainNamespace::Eip155 => account.address().to_owned(),
                ChainNamespace::Wallet if account.chain().reference() == Some("eip155") => {
                    account.address().to_owned()
                }
                ChainNamespace::Wallet | ChainNamespace::Solana | ChainNamespace::Bip122 => {
                    account.to_string()
                }
            };
            if !addresses.iter().any(|known| known.eq_ignore_ascii_case(&hint)) {
                addresses.push(hint);
            }
        }
    }
    addresses
}

#[cfg(test)]
mod tests;
