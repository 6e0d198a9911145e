use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::math::amount_string;
use crate::opportunities::ids::AssetId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub asset_id: AssetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    /// Number of decimals between base units and display units, when known
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub icon: Option<String>,
}

pub type AssetsById = HashMap<AssetId, Asset>;

/// Latest market entry for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    #[serde(with = "amount_string")]
    pub price: BigDecimal,
}

pub type MarketDataById = HashMap<AssetId, MarketData>;
