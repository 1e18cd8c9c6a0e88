use crate::chain::ChainScopeId;
use crate::error::{ScopeError, UnsupportedReason};
use crate::scope::ScopeMap;
use serde::{Deserialize, Serialize};

/// Disjoint partition of a scope map by chain capability.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScopeBuckets {
    pub supported: ScopeMap,
    pub supportable: ScopeMap,
    pub unsupportable: ScopeMap,
}

impl ScopeBuckets {
    pub fn len(&self) -> usize {
        self.supported.len() + self.supportable.len() + self.unsupportable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any chain can end up in a grant.
    pub fn has_grantable(&self) -> bool {
        !self.supported.is_empty() || !self.supportable.is_empty()
    }
}

/// Classifies every chain in `scopes`.
///
/// `is_supportable` is only consulted for chains `is_supported` rejected;
/// each predicate runs at most once per chain.
pub fn bucket_scopes<S, P>(
    scopes: &ScopeMap,
    mut is_supported: S,
    mut is_supportable: P,
) -> ScopeBuckets
where
    S: FnMut(&ChainScopeId) -> bool,
    P: FnMut(&ChainScopeId) -> bool,
{
    let mut buckets = ScopeBuckets::default();
    for (chain, scope) in scopes.iter() {
        let bucket = if is_supported(chain) {
            &mut buckets.supported
        } else if is_supportable(chain) {
            &mut buckets.supportable
        } else {
            &mut buckets.unsupportable
        };
        bucket.insert(chain.clone(), scope.clone());
    }
    buckets
}

/// Re-checks every entry of an unsupportable bucket and fails if any exist.
///
/// A chain that `is_supported` now accepts was observed in two different
/// capability states; the first such chain is reported. Otherwise the first
/// entry is reported as plainly not supported.
pub fn assert_scopes_supported<S>(
    unsupportable: &ScopeMap,
    mut is_supported: S,
) -> Result<(), ScopeError>
where
    S: FnMut(&ChainScopeId) -> bool,
{
    let Some(first) = unsupportable.keys().next() else {
        return Ok(());
    };
    let (chain, reason) = match unsupportable.keys().find(|chain| is_supported(*chain)) {
        Some(flipped) => (flipped, UnsupportedReason::InconsistentCapabilityState),
        None => (first, UnsupportedReason::NotSupported),
    };
    Err(ScopeError::UnsupportedScope { scope: chain.to_string(), reason })
}
