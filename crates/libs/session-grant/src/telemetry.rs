use serde::{Deserialize, Serialize};

pub const DAPP_VIEWED: &str = "Dapp Viewed";

/// Analytics event handed to a [`TelemetrySink`](crate::host::TelemetrySink).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub event: String,
    pub category: String,
    pub referrer: String,
    pub properties: DappViewedProperties,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DappViewedProperties {
    pub is_first_visit: bool,
    pub number_of_accounts: usize,
    pub number_of_accounts_connected: usize,
}

impl TelemetryEvent {
    pub fn dapp_viewed(
        category: impl Into<String>,
        origin: impl Into<String>,
        properties: DappViewedProperties,
    ) -> Self {
        Self {
            event: DAPP_VIEWED.to_owned(),
            category: category.into(),
            referrer: origin.into(),
            properties,
        }
    }
}
