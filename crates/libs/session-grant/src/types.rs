use caip_scope::{ChainScopeId, RawScopes, ScopeMap, SessionGrant};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

// ── Negotiation ───────────────────────────────────────────────────────────────

/// A dapp's session-creation request.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRequest {
    pub origin: String,
    #[serde(default)]
    pub required_scopes: RawScopes,
    #[serde(default)]
    pub optional_scopes: RawScopes,
    /// `Some` with an empty map is a malformed request, distinct from `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_properties: Option<JsonMap<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoped_properties: Option<JsonMap<String, JsonValue>>,
    /// Grant already held by this origin; new scopes are merged on top of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_grant: Option<SessionGrant>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationResult {
    pub session_scopes: ScopeMap,
    #[serde(default)]
    pub session_properties: JsonMap<String, JsonValue>,
    pub grant: SessionGrant,
    /// Chains this call added to the wallet, in the order they were added.
    #[serde(default)]
    pub provisioned_chains: Vec<ChainScopeId>,
}

// ── Account approval ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountApprovalRequest {
    pub origin: String,
    /// Chains the session could be granted on.
    pub chain_ids: Vec<ChainScopeId>,
    /// Addresses the dapp asked for, offered as preselection hints only.
    pub requested_accounts: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountApproval {
    pub accounts: Vec<String>,
    /// Chains the user approved, when the approval surface lets them pick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_ids: Option<Vec<ChainScopeId>>,
}

impl AccountApproval {
    pub fn accounts<I, S>(accounts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { accounts: accounts.into_iter().map(Into::into).collect(), chain_ids: None }
    }

    pub fn with_chain_ids(mut self, chain_ids: Vec<ChainScopeId>) -> Self {
        self.chain_ids = Some(chain_ids);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_session_properties_stay_distinct_from_absent() {
        let request: NegotiationRequest = serde_json::from_value(json!({
            "origin": "https://dapp.example",
            "requiredScopes": { "eip155:1": { "methods": ["eth_chainId"] } },
            "sessionProperties": {}
        }))
        .expect("request");
        assert_eq!(request.session_properties, Some(JsonMap::new()));
        assert!(request.optional_scopes.is_empty());

        let request: NegotiationRequest =
            serde_json::from_value(json!({ "origin": "https://dapp.example" })).expect("request");
        assert!(request.session_properties.is_none());
        assert!(request.previous_grant.is_none());
    }
}
