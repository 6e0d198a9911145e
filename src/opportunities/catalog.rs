use std::collections::HashMap;
use std::fs;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::ids::AssetId;
use crate::error::OpportunityError;

/// Static display overrides for one opportunity asset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub reward_address: Option<String>,
    #[serde(default)]
    pub apy: Option<Decimal>,
    #[serde(default)]
    pub tvl: Option<Decimal>,
    #[serde(default)]
    pub expired: Option<bool>,
}

/// Earn catalog keyed by opportunity asset id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarnCatalog {
    entries: HashMap<AssetId, CatalogEntry>,
}

impl EarnCatalog {
    pub fn new(entries: HashMap<AssetId, CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn get(&self, asset_id: &AssetId) -> Option<&CatalogEntry> {
        self.entries.get(asset_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn from_json_str(json: &str) -> Result<Self, OpportunityError> {
        let entries: HashMap<AssetId, CatalogEntry> = serde_json::from_str(json)?;
        for (asset_id, entry) in &entries {
            debug!(
                %asset_id,
                provider = entry.provider.as_deref().unwrap_or("-"),
                contract_address = entry.contract_address.as_deref().unwrap_or("-"),
                "Loaded catalog entry"
            );
        }
        Ok(Self { entries })
    }

    #[instrument(fields(on_close = true))]
    pub fn load_from_file(path: &str) -> Result<Self, OpportunityError> {
        info!(file = %path, "Loading earn catalog from file");
        let content = fs::read_to_string(path).map_err(|source| OpportunityError::Io {
            path: path.to_string(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        info!(entry_count = catalog.len(), "Earn catalog loaded");
        Ok(catalog)
    }
}
