use crate::chain::ChainScopeId;
use crate::eip3085::Eip3085Params;
use crate::error::ScopeError;
use crate::ordered::OrderedMap;
use crate::scope::ScopeMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

/// Property name carrying an EIP-3085 provisioning payload.
pub const EIP3085_PROPERTY: &str = "eip3085";

/// Recognised per-chain properties that survived validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eip3085: Option<Eip3085Params>,
}

impl ChainProperties {
    pub fn is_empty(&self) -> bool {
        self.eip3085.is_none()
    }
}

/// Validated scoped properties keyed by requested chain.
pub type ScopedProperties = OrderedMap<ChainScopeId, ChainProperties>;

/// Keeps the properties addressed at a requested chain and validates each
/// recognised payload with `validate_eip3085`.
///
/// Keys naming no requested chain are dropped. A payload that fails
/// validation is stripped but its chain entry stays, so the failure only
/// surfaces if provisioning later needs it.
pub fn process_scoped_properties<F>(
    required: &ScopeMap,
    optional: &ScopeMap,
    raw: Option<&JsonMap<String, JsonValue>>,
    validate_eip3085: F,
) -> ScopedProperties
where
    F: Fn(&ChainScopeId, &JsonValue) -> Result<Eip3085Params, ScopeError>,
{
    let mut processed = ScopedProperties::new();
    let Some(raw) = raw else {
        return processed;
    };

    for (key, value) in raw {
        let Ok(chain) = ChainScopeId::parse(key) else {
            log::debug!("dropping scoped properties for malformed scope '{key}'");
            continue;
        };
        if !required.contains_key(&chain) && !optional.contains_key(&chain) {
            log::debug!("dropping scoped properties for unrequested scope {chain}");
            continue;
        }

        let mut properties = ChainProperties::default();
        if let Some(payload) = value.get(EIP3085_PROPERTY) {
            match validate_eip3085(&chain, payload) {
                Ok(params) => properties.eip3085 = Some(params),
                Err(err) => log::warn!("stripping invalid {EIP3085_PROPERTY} for {chain}: {err}"),
            }
        }
        processed.insert(chain, properties);
    }
    processed
}

/// Whether a validated provisioning payload exists for `chain`.
pub fn is_chain_id_supportable(properties: &ScopedProperties, chain: &ChainScopeId) -> bool {
    properties.get(chain).is_some_and(|properties| properties.eip3085.is_some())
}
