use crate::chain::{AccountId, ChainScopeId};
use crate::ordered::OrderedMap;
use serde::{Deserialize, Serialize};

/// Methods, notifications and accounts granted on one chain.
///
/// `methods`, `notifications` and `accounts` behave as ordered sets:
/// constructors, deserialization and the merger never leave duplicates
/// behind.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "ScopeObjectFields")]
pub struct ScopeObject {
    pub methods: Vec<String>,
    pub notifications: Vec<String>,
    pub accounts: Vec<AccountId>,
}

#[derive(Deserialize)]
struct ScopeObjectFields {
    #[serde(default)]
    methods: Vec<String>,
    #[serde(default)]
    notifications: Vec<String>,
    #[serde(default)]
    accounts: Vec<AccountId>,
}

impl From<ScopeObjectFields> for ScopeObject {
    fn from(fields: ScopeObjectFields) -> Self {
        Self::new(fields.methods, fields.notifications).with_accounts(fields.accounts)
    }
}

impl ScopeObject {
    pub fn new<M, N>(methods: M, notifications: N) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let mut scope = Self::default();
        for method in methods {
            push_unique(&mut scope.methods, method.into());
        }
        for notification in notifications {
            push_unique(&mut scope.notifications, notification.into());
        }
        scope
    }

    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = AccountId>) -> Self {
        for account in accounts {
            push_unique(&mut self.accounts, account);
        }
        self
    }
}

/// Flattened scopes keyed by concrete chain, in first-seen order.
pub type ScopeMap = OrderedMap<ChainScopeId, ScopeObject>;

/// A scope entry as a dapp sends it, before flattening.
///
/// A namespace key (`eip155`) carries `references`; a chain key
/// (`eip155:1`) must not.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawScopeObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub notifications: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
}

/// Requested scopes keyed by the raw scope string.
pub type RawScopes = OrderedMap<String, RawScopeObject>;

pub(crate) fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
