use crate::scope::{push_unique, ScopeMap, ScopeObject};

/// Union of two scope maps keyed by chain.
///
/// Chains keep first-seen order (`a` first). Within a chain, methods,
/// notifications and accounts are unions with `a`'s entries ahead of `b`'s.
pub fn merge_scopes(a: &ScopeMap, b: &ScopeMap) -> ScopeMap {
    let mut merged = a.clone();
    for (chain, scope) in b.iter() {
        match merged.get_mut(chain) {
            Some(existing) => merge_scope_object(existing, scope),
            None => {
                merged.insert(chain.clone(), scope.clone());
            }
        }
    }
    merged
}

/// Merges `other` into `target` in place.
pub fn merge_scope_object(target: &mut ScopeObject, other: &ScopeObject) {
    for method in &other.methods {
        push_unique(&mut target.methods, method.clone());
    }
    for notification in &other.notifications {
        push_unique(&mut target.notifications, notification.clone());
    }
    for account in &other.accounts {
        push_unique(&mut target.accounts, account.clone());
    }
}
