use crate::error::ScopeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

const NAMESPACE_MIN_LEN: usize = 3;
const NAMESPACE_MAX_LEN: usize = 8;
const REFERENCE_MAX_LEN: usize = 32;
const ADDRESS_MAX_LEN: usize = 128;
const BIP122_REFERENCE_LEN: usize = 32;

/// Chain namespaces this engine knows how to negotiate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChainNamespace {
    Eip155,
    Solana,
    Bip122,
    Wallet,
}

impl ChainNamespace {
    pub const ALL: [ChainNamespace; 4] = [Self::Eip155, Self::Solana, Self::Bip122, Self::Wallet];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eip155 => "eip155",
            Self::Solana => "solana",
            Self::Bip122 => "bip122",
            Self::Wallet => "wallet",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|namespace| namespace.as_str() == input)
    }

    /// Whether a namespace key without a reference is a complete scope.
    pub fn allows_bare_scope(self) -> bool {
        match self {
            Self::Wallet => true,
            Self::Eip155 | Self::Solana | Self::Bip122 => false,
        }
    }
}

impl fmt::Display for ChainNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical CAIP-2 chain identifier (or the bare `wallet` scope).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainScopeId {
    namespace: ChainNamespace,
    reference: Option<String>,
}

impl ChainScopeId {
    pub fn parse(input: &str) -> Result<Self, ScopeError> {
        let trimmed = input.trim();
        let (raw_namespace, raw_reference) = match trimmed.split_once(':') {
            Some((namespace, reference)) => (namespace, Some(reference)),
            None => (trimmed, None),
        };
        let namespace = parse_namespace(trimmed, raw_namespace)?;
        match raw_reference {
            None if namespace.allows_bare_scope() => Ok(Self { namespace, reference: None }),
            None => Err(ScopeError::invalid_scope(input, "missing chain reference")),
            Some(reference) => Self::with_reference(namespace, reference)
                .map_err(|reason| ScopeError::invalid_scope(input, reason)),
        }
    }

    pub fn with_reference(namespace: ChainNamespace, reference: &str) -> Result<Self, String> {
        if reference.is_empty() || reference.len() > REFERENCE_MAX_LEN {
            return Err(format!("reference must be 1..={REFERENCE_MAX_LEN} characters"));
        }
        if !reference.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err("reference contains characters outside [-_a-zA-Z0-9]".to_owned());
        }
        let reference = match namespace {
            ChainNamespace::Eip155 => {
                if !reference.chars().all(|c| c.is_ascii_digit()) {
                    return Err("eip155 reference must be a decimal chain id".to_owned());
                }
                let chain_id: u64 =
                    reference.parse().map_err(|_| "eip155 chain id is out of range".to_owned())?;
                chain_id.to_string()
            }
            ChainNamespace::Bip122 => {
                if reference.len() != BIP122_REFERENCE_LEN
                    || !reference.chars().all(|c| c.is_ascii_hexdigit())
                {
                    return Err("bip122 reference must be a 32 character genesis hash prefix"
                        .to_owned());
                }
                reference.to_ascii_lowercase()
            }
            ChainNamespace::Wallet => reference.to_ascii_lowercase(),
            ChainNamespace::Solana => reference.to_owned(),
        };
        Ok(Self { namespace, reference: Some(reference) })
    }

    pub fn wallet() -> Self {
        Self { namespace: ChainNamespace::Wallet, reference: None }
    }

    pub fn from_eip155_chain_id(chain_id: u64) -> Self {
        Self { namespace: ChainNamespace::Eip155, reference: Some(chain_id.to_string()) }
    }

    pub fn namespace(&self) -> ChainNamespace {
        self.namespace
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn eip155_chain_id(&self) -> Option<u64> {
        match self.namespace {
            ChainNamespace::Eip155 => self.reference.as_deref()?.parse().ok(),
            ChainNamespace::Solana | ChainNamespace::Bip122 | ChainNamespace::Wallet => None,
        }
    }

    /// Hex quantity form used by EIP-3085 payloads, e.g. `0x89`.
    pub fn eip155_hex_chain_id(&self) -> Option<String> {
        self.eip155_chain_id().map(|chain_id| format!("{chain_id:#x}"))
    }

    pub fn account(&self, address: &str) -> Result<AccountId, ScopeError> {
        AccountId::new(self.clone(), address)
    }
}

impl fmt::Display for ChainScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference {
            Some(reference) => write!(f, "{}:{}", self.namespace, reference),
            None => f.write_str(self.namespace.as_str()),
        }
    }
}

impl std::str::FromStr for ChainScopeId {
    type Err = ScopeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl TryFrom<String> for ChainScopeId {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ChainScopeId> for String {
    fn from(value: ChainScopeId) -> Self {
        value.to_string()
    }
}

fn parse_namespace(scope: &str, raw: &str) -> Result<ChainNamespace, ScopeError> {
    let lowered = raw.to_ascii_lowercase();
    if lowered.len() < NAMESPACE_MIN_LEN || lowered.len() > NAMESPACE_MAX_LEN {
        return Err(ScopeError::invalid_scope(
            scope,
            format!("namespace must be {NAMESPACE_MIN_LEN}..={NAMESPACE_MAX_LEN} characters"),
        ));
    }
    if !lowered.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return Err(ScopeError::invalid_scope(scope, "namespace contains invalid characters"));
    }
    ChainNamespace::parse(&lowered).ok_or_else(|| {
        ScopeError::invalid_scope(scope, format!("unrecognized namespace '{lowered}'"))
    })
}

/// CAIP-10 account identifier: a chain scope plus an address.
///
/// EVM addresses (including `wallet:eip155`) compare case-insensitively;
/// every other namespace compares addresses exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId {
    chain: ChainScopeId,
    address: String,
}

impl AccountId {
    pub fn new(chain: ChainScopeId, address: &str) -> Result<Self, ScopeError> {
        let address = address.trim();
        if address.is_empty() || address.len() > ADDRESS_MAX_LEN {
            return Err(ScopeError::invalid_scope(
                format!("{chain}:{address}"),
                format!("account address must be 1..={ADDRESS_MAX_LEN} characters"),
            ));
        }
        if !address.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '%')) {
            return Err(ScopeError::invalid_scope(
                format!("{chain}:{address}"),
                "account address contains invalid characters",
            ));
        }
        Ok(Self { chain, address: address.to_owned() })
    }

    pub fn parse(input: &str) -> Result<Self, ScopeError> {
        let (chain, address) = input
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ScopeError::invalid_scope(input, "account id must be chain:address"))?;
        Self::new(ChainScopeId::parse(chain)?, address)
    }

    pub fn chain(&self) -> &ChainScopeId {
        &self.chain
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn case_insensitive(&self) -> bool {
        match self.chain.namespace() {
            ChainNamespace::Eip155 => true,
            ChainNamespace::Wallet => self.chain.reference() == Some("eip155"),
            ChainNamespace::Solana | ChainNamespace::Bip122 => false,
        }
    }

    /// Whether this account refers to `address`, honouring namespace casing rules.
    pub fn matches_address(&self, address: &str) -> bool {
        if self.case_insensitive() {
            self.address.eq_ignore_ascii_case(address)
        } else {
            self.address == address
        }
    }
}

impl PartialEq for AccountId {
    fn eq(&self, other: &Self) -> bool {
        self.chain == other.chain && self.matches_address(&other.address)
    }
}

impl Eq for AccountId {}

impl Hash for AccountId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain.hash(state);
        if self.case_insensitive() {
            self.address.to_ascii_lowercase().hash(state);
        } else {
            self.address.hash(state);
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.address)
    }
}

impl TryFrom<String> for AccountId {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}
