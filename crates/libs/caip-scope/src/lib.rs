//! CAIP-25 scope algebra: identifiers, flattening, bucketing and merging.
//!
//! Everything here is synchronous and side-effect free; the negotiation
//! protocol that drives it lives in `session-grant`.

mod accounts;
mod bucket;
mod caveat;
mod chain;
mod eip3085;
mod error;
mod known;
mod merge;
mod ordered;
mod parse;
mod properties;
mod scope;

pub use accounts::assign_accounts_to_scopes;
pub use bucket::{assert_scopes_supported, bucket_scopes, ScopeBuckets};
pub use caveat::{
    remove_account, remove_scope, validate_session_grant, CaveatMutation, SessionGrant,
};
pub use chain::{AccountId, ChainNamespace, ChainScopeId};
pub use eip3085::{
    validate_add_ethereum_chain_params, validate_scoped_property_eip3085, Eip3085Params,
    NativeCurrency, NetworkConfiguration, RpcEndpoint, MAX_SAFE_CHAIN_ID,
};
pub use error::{ScopeError, UnsupportedReason};
pub use known::{
    known_methods, known_notifications, known_scope_object, known_wallet_namespace_methods,
};
pub use merge::{merge_scope_object, merge_scopes};
pub use ordered::OrderedMap;
pub use parse::{flatten_scopes, validate_and_flatten_scopes};
pub use properties::{
    is_chain_id_supportable, process_scoped_properties, ChainProperties, ScopedProperties,
    EIP3085_PROPERTY,
};
pub use scope::{RawScopeObject, RawScopes, ScopeMap, ScopeObject};
