use crate::chain::{ChainNamespace, ChainScopeId};
use crate::error::ScopeError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

/// Largest chain id the network registry can represent.
pub const MAX_SAFE_CHAIN_ID: u64 = 4_503_599_627_370_476;

const NATIVE_CURRENCY_DECIMALS: u8 = 18;
const NATIVE_SYMBOL_MAX_LEN: usize = 6;
const DEFAULT_NATIVE_SYMBOL: &str = "ETH";
const DEFAULT_NATIVE_NAME: &str = "Ether";

/// `wallet_addEthereumChain` parameter object as it arrives on the wire.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct AddEthereumChainParameter {
    chain_id: Option<JsonValue>,
    chain_name: Option<JsonValue>,
    native_currency: Option<NativeCurrencyParameter>,
    #[serde(default)]
    rpc_urls: Vec<JsonValue>,
    block_explorer_urls: Option<Vec<JsonValue>>,
    #[serde(default)]
    icon_urls: Vec<JsonValue>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
struct NativeCurrencyParameter {
    name: Option<String>,
    symbol: Option<String>,
    decimals: Option<JsonValue>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// EIP-3085 parameters that passed validation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Eip3085Params {
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_url: String,
    pub block_explorer_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RpcEndpoint {
    pub url: String,
}

/// Normalised configuration handed to the network registry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfiguration {
    pub chain_id: ChainScopeId,
    pub name: String,
    pub native_currency: String,
    pub rpc_endpoints: Vec<RpcEndpoint>,
    pub default_rpc_endpoint_index: usize,
    pub block_explorer_urls: Vec<String>,
    pub default_block_explorer_url_index: Option<usize>,
}

impl Eip3085Params {
    pub fn chain(&self) -> ChainScopeId {
        ChainScopeId::from_eip155_chain_id(self.chain_id)
    }

    pub fn hex_chain_id(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    pub fn to_network_configuration(&self) -> NetworkConfiguration {
        let block_explorer_urls: Vec<String> = self.block_explorer_url.iter().cloned().collect();
        NetworkConfiguration {
            chain_id: self.chain(),
            name: self.chain_name.clone(),
            native_currency: self.native_currency.symbol.clone(),
            rpc_endpoints: vec![RpcEndpoint { url: self.rpc_url.clone() }],
            default_rpc_endpoint_index: 0,
            default_block_explorer_url_index: (!block_explorer_urls.is_empty()).then_some(0),
            block_explorer_urls,
        }
    }
}

/// Validates a `wallet_addEthereumChain` style payload.
pub fn validate_add_ethereum_chain_params(value: &JsonValue) -> Result<Eip3085Params, ScopeError> {
    if !value.is_object() {
        return Err(ScopeError::invalid_network_params("expected a single object parameter"));
    }
    let raw: AddEthereumChainParameter = serde_json::from_value(value.clone())
        .map_err(|err| ScopeError::invalid_network_params(err.to_string()))?;

    let chain_id = parse_hex_chain_id(raw.chain_id.as_ref())?;

    let rpc_url = raw
        .rpc_urls
        .iter()
        .filter_map(JsonValue::as_str)
        .find(|candidate| is_https_or_localhost(candidate))
        .ok_or_else(|| {
            ScopeError::invalid_network_params(
                "expected at least one https or localhost URL in 'rpcUrls'",
            )
        })?
        .to_owned();

    let block_explorer_url = match raw.block_explorer_urls.as_deref() {
        None | Some([]) => None,
        Some(urls) => Some(
            urls.iter()
                .filter_map(JsonValue::as_str)
                .find(|candidate| is_https_or_localhost(candidate))
                .ok_or_else(|| {
                    ScopeError::invalid_network_params(
                        "expected null or an array with at least one valid https or localhost \
                         URL in 'blockExplorerUrls'",
                    )
                })?
                .to_owned(),
        ),
    };

    let chain_name = raw
        .chain_name
        .as_ref()
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ScopeError::invalid_network_params("expected a non-empty 'chainName'"))?
        .to_owned();

    let native_currency = validate_native_currency(raw.native_currency)?;

    Ok(Eip3085Params { chain_id, chain_name, native_currency, rpc_url, block_explorer_url })
}

/// Validates an EIP-3085 payload attached to `scope` as a scoped property.
///
/// The scope must be an `eip155` chain whose reference equals the payload's
/// `chainId`.
pub fn validate_scoped_property_eip3085(
    scope: &ChainScopeId,
    value: &JsonValue,
) -> Result<Eip3085Params, ScopeError> {
    if scope.namespace() != ChainNamespace::Eip155 {
        return Err(ScopeError::invalid_network_params(format!(
            "eip3085 properties are only valid on eip155 scopes, got '{scope}'"
        )));
    }
    let params = validate_add_ethereum_chain_params(value)?;
    if scope.eip155_chain_id() != Some(params.chain_id) {
        return Err(ScopeError::invalid_network_params(format!(
            "chainId {} does not match scope '{scope}'",
            params.hex_chain_id()
        )));
    }
    Ok(params)
}

fn parse_hex_chain_id(value: Option<&JsonValue>) -> Result<u64, ScopeError> {
    let raw = value.and_then(JsonValue::as_str).ok_or_else(|| {
        ScopeError::invalid_network_params("expected a 0x-prefixed hexadecimal 'chainId'")
    })?;
    let digits = raw
        .strip_prefix("0x")
        .filter(|digits| {
            !digits.is_empty()
                && !digits.starts_with('0')
                && digits.chars().all(|c| c.is_ascii_hexdigit())
        })
        .ok_or_else(|| {
            ScopeError::invalid_network_params(format!(
                "expected a 0x-prefixed, unpadded, non-zero hexadecimal 'chainId', got '{raw}'"
            ))
        })?;
    let chain_id = u64::from_str_radix(digits, 16)
        .ok()
        .filter(|chain_id| *chain_id <= MAX_SAFE_CHAIN_ID)
        .ok_or_else(|| {
            ScopeError::invalid_network_params(format!(
                "'chainId' must be at most {MAX_SAFE_CHAIN_ID:#x}, got '{raw}'"
            ))
        })?;
    Ok(chain_id)
}

fn validate_native_currency(
    raw: Option<NativeCurrencyParameter>,
) -> Result<NativeCurrency, ScopeError> {
    let Some(raw) = raw else {
        return Ok(NativeCurrency {
            name: DEFAULT_NATIVE_NAME.to_owned(),
            symbol: DEFAULT_NATIVE_SYMBOL.to_owned(),
            decimals: NATIVE_CURRENCY_DECIMALS,
        });
    };
    let decimals = raw.decimals.as_ref().and_then(JsonValue::as_u64);
    if decimals != Some(u64::from(NATIVE_CURRENCY_DECIMALS)) {
        return Err(ScopeError::invalid_network_params(format!(
            "expected the number {NATIVE_CURRENCY_DECIMALS} for 'nativeCurrency.decimals'"
        )));
    }
    let symbol = raw.symbol.as_deref().map(str::trim).unwrap_or_default();
    let symbol_len = symbol.chars().count();
    if symbol_len == 0 || symbol_len > NATIVE_SYMBOL_MAX_LEN {
        return Err(ScopeError::invalid_network_params(format!(
            "expected 1-{NATIVE_SYMBOL_MAX_LEN} character string 'nativeCurrency.symbol'"
        )));
    }
    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(symbol)
        .to_owned();
    Ok(NativeCurrency { name, symbol: symbol.to_owned(), decimals: NATIVE_CURRENCY_DECIMALS })
}

fn is_https_or_localhost(candidate: &str) -> bool {
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };
    match url.scheme() {
        "https" => url.host_str().is_some(),
        "http" => matches!(url.host_str(), Some("localhost" | "127.0.0.1")),
        _ => false,
    }
}
