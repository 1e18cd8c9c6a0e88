use caip_scope::{validate_scoped_property_eip3085, ChainScopeId, Eip3085Params};
use serde_json::Value as JsonValue;

use crate::error::SessionError;
use crate::host::NetworkRegistry;

/// Makes sure the wallet can serve `chain`, adding it from an EIP-3085
/// payload when needed.
///
/// Returns the chain only when this call added it; the caller records it
/// for rollback. An already served chain is left untouched.
pub async fn validate_and_add_eip3085<R>(
    registry: &R,
    chain: &ChainScopeId,
    payload: &JsonValue,
) -> Result<Option<ChainScopeId>, SessionError>
where
    R: NetworkRegistry + ?Sized,
{
    let params = validate_scoped_property_eip3085(chain, payload)?;
    add_network_if_missing(registry, chain, &params).await
}

/// Adds `chain` from already validated parameters unless a network client
/// serves it.
pub async fn add_network_if_missing<R>(
    registry: &R,
    chain: &ChainScopeId,
    params: &Eip3085Params,
) -> Result<Option<ChainScopeId>, SessionError>
where
    R: NetworkRegistry + ?Sized,
{
    if let Some(client) = registry.find_network_client_id(chain) {
        log::debug!("{chain} already served by network client {client}");
        return Ok(None);
    }

    let added = registry
        .add_network(params.to_network_configuration())
        .await
        .map_err(|source| SessionError::NetworkProvisioning { chain: chain.to_string(), source })?;
    Ok(Some(added))
}
