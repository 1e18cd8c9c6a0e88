use crate::chain::{AccountId, ChainNamespace, ChainScopeId};
use crate::error::ScopeError;
use crate::scope::{push_unique, RawScopeObject, RawScopes, ScopeMap, ScopeObject};

/// Validates both requested scope maps and expands namespace shorthand
/// into one entry per concrete chain.
pub fn validate_and_flatten_scopes(
    required: &RawScopes,
    optional: &RawScopes,
) -> Result<(ScopeMap, ScopeMap), ScopeError> {
    Ok((flatten_scopes(required)?, flatten_scopes(optional)?))
}

pub fn flatten_scopes(raw: &RawScopes) -> Result<ScopeMap, ScopeError> {
    let mut flattened = ScopeMap::new();
    for (key, raw_scope) in raw.iter() {
        for (chain, scope) in expand_entry(key, raw_scope)? {
            match flattened.get(&chain) {
                Some(existing) if *existing != scope => {
                    return Err(ScopeError::invalid_scope(
                        chain.to_string(),
                        "conflicting definitions between chain key and namespace shorthand",
                    ));
                }
                Some(_) => {}
                None => {
                    flattened.insert(chain, scope);
                }
            }
        }
    }
    Ok(flattened)
}

fn expand_entry(
    key: &str,
    raw_scope: &RawScopeObject,
) -> Result<Vec<(ChainScopeId, ScopeObject)>, ScopeError> {
    let is_chain_key = key.contains(':') || raw_scope.references.is_none();
    if is_chain_key {
        if raw_scope.references.is_some() {
            return Err(ScopeError::invalid_scope(
                key,
                "references are only allowed on namespace keys",
            ));
        }
        let chain = ChainScopeId::parse(key)?;
        let scope = build_scope(key, &chain, raw_scope)?;
        return Ok(vec![(chain, scope)]);
    }

    let namespace = ChainNamespace::parse(&key.trim().to_ascii_lowercase())
        .ok_or_else(|| ScopeError::invalid_scope(key, "unrecognized namespace"))?;
    let references = raw_scope.references.as_deref().unwrap_or_default();
    if references.is_empty() {
        return Err(ScopeError::invalid_scope(key, "references must not be empty"));
    }

    let mut expanded = Vec::with_capacity(references.len());
    for reference in references {
        let chain = ChainScopeId::with_reference(namespace, reference.trim())
            .map_err(|reason| ScopeError::invalid_scope(format!("{key}:{reference}"), reason))?;
        let scope = build_scope(key, &chain, raw_scope)?;
        expanded.push((chain, scope));
    }
    Ok(expanded)
}

fn build_scope(
    key: &str,
    chain: &ChainScopeId,
    raw_scope: &RawScopeObject,
) -> Result<ScopeObject, ScopeError> {
    let mut scope = ScopeObject::default();
    for method in &raw_scope.methods {
        push_unique(&mut scope.methods, non_empty(key, "method", method)?);
    }
    for notification in &raw_scope.notifications {
        push_unique(&mut scope.notifications, non_empty(key, "notification", notification)?);
    }
    for raw_account in &raw_scope.accounts {
        let account = AccountId::parse(raw_account)?;
        if account.chain().namespace() != chain.namespace() {
            return Err(ScopeError::invalid_scope(
                key,
                format!(
                    "account '{raw_account}' does not belong to namespace {}",
                    chain.namespace()
                ),
            ));
        }
        push_unique(&mut scope.accounts, account);
    }
    Ok(scope)
}

fn non_empty(key: &str, what: &str, value: &str) -> Result<String, ScopeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScopeError::invalid_scope(key, format!("{what} names must not be empty")));
    }
    Ok(trimmed.to_owned())
}
