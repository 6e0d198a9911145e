use std::collections::{HashMap, HashSet};

use bigdecimal::{BigDecimal, One, Zero};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::catalog::{CatalogEntry, EarnCatalog};
use super::ids::{AssetId, StakingId};
use super::types::{OpportunityMetadata, OpportunityType, RewardAmounts, UserStakingOpportunity};
use crate::math::{self, FALLBACK_PRECISION, amount_string};
use crate::state::assets::{Asset, AssetsById, MarketDataById};

/// Display fields resolved from layered sources
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    pub provider: Option<String>,
    pub contract_address: Option<String>,
    pub reward_address: Option<String>,
    pub apy: Option<Decimal>,
    pub tvl: Option<Decimal>,
    pub expired: Option<bool>,
}

impl DisplayFields {
    /// Fields set on `higher` replace ours; unset fields fall through
    pub fn overlay(self, higher: DisplayFields) -> DisplayFields {
        DisplayFields {
            provider: higher.provider.or(self.provider),
            contract_address: higher.contract_address.or(self.contract_address),
            reward_address: higher.reward_address.or(self.reward_address),
            apy: higher.apy.or(self.apy),
            tvl: higher.tvl.or(self.tvl),
            expired: higher.expired.or(self.expired),
        }
    }

    /// Resolve the layers for one opportunity, lowest precedence first:
    /// computed defaults, then the static catalog entry, then live metadata.
    pub fn resolve(metadata: &OpportunityMetadata, catalog: &EarnCatalog) -> DisplayFields {
        let computed = DisplayFields {
            contract_address: metadata
                .underlying_asset_id()
                .filter(|asset_id| asset_id.is_token())
                .map(|asset_id| asset_id.asset_reference().to_string()),
            ..Default::default()
        };
        let catalog_layer = catalog.get(&metadata.asset_id).map(DisplayFields::from).unwrap_or_default();
        let live = DisplayFields {
            provider: Some(metadata.provider.clone()).filter(|p| !p.is_empty()),
            apy: metadata.apy,
            tvl: metadata.tvl,
            expired: metadata.expired,
            ..Default::default()
        };
        [catalog_layer, live].into_iter().fold(computed, DisplayFields::overlay)
    }
}

impl From<&CatalogEntry> for DisplayFields {
    fn from(entry: &CatalogEntry) -> Self {
        DisplayFields {
            provider: entry.provider.clone(),
            contract_address: entry.contract_address.clone(),
            reward_address: entry.reward_address.clone(),
            apy: entry.apy,
            tvl: entry.tvl,
            expired: entry.expired,
        }
    }
}

/// UI-facing view of one opportunity, aggregated or per account
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnOpportunityView {
    pub staking_id: StakingId,
    pub asset_id: AssetId,
    pub underlying_asset_id: Option<AssetId>,
    pub underlying_asset_ids: Vec<AssetId>,
    pub reward_asset_ids: Vec<AssetId>,
    #[serde(rename = "type")]
    pub opportunity_type: OpportunityType,
    #[serde(flatten)]
    pub display: DisplayFields,
    pub chain_id: String,
    #[serde(with = "amount_string")]
    pub staked_amount_crypto_base_unit: BigDecimal,
    pub rewards_amounts_crypto_base_unit: RewardAmounts,
    #[serde(with = "amount_string")]
    pub crypto_amount_base_unit: BigDecimal,
    #[serde(with = "amount_string")]
    pub crypto_amount_precision: BigDecimal,
    #[serde(with = "amount_string")]
    pub fiat_amount: BigDecimal,
    pub icons: Vec<String>,
    pub opportunity_name: String,
    pub is_loaded: bool,
}

impl EarnOpportunityView {
    pub fn is_expired(&self) -> bool {
        self.display.expired.unwrap_or(false)
    }

    pub fn has_position(&self) -> bool {
        math::is_positive(&self.staked_amount_crypto_base_unit)
            || self.rewards_amounts_crypto_base_unit.any_positive()
    }

    fn dedupe_key(&self) -> &str {
        self.display.contract_address.as_deref().unwrap_or(self.asset_id.as_str())
    }
}

/// Precision and price used to value an opportunity
#[derive(Debug, Clone, PartialEq)]
pub struct Valuation {
    pub precision: u32,
    pub price: BigDecimal,
}

impl Valuation {
    /// Precision comes from the opportunity asset, then its underlying asset, then
    /// `FALLBACK_PRECISION`. The price is read for the first of those two assets
    /// that is known, and is zero without a market entry.
    pub fn resolve(metadata: &OpportunityMetadata, assets: &AssetsById, market_data: &MarketDataById) -> Self {
        let asset = assets.get(&metadata.asset_id);
        let underlying = metadata.underlying_asset_id().and_then(|id| assets.get(id));

        let precision = asset
            .and_then(|a| a.precision)
            .or_else(|| underlying.and_then(|a| a.precision))
            .unwrap_or(FALLBACK_PRECISION);

        let price = asset
            .or(underlying)
            .and_then(|a| market_data.get(&a.asset_id))
            .map(|m| m.price.clone())
            .unwrap_or_else(BigDecimal::zero);

        Self { precision, price }
    }

    pub fn crypto_amount_precision(&self, amount_base_unit: &BigDecimal) -> BigDecimal {
        math::from_base_unit(amount_base_unit, self.precision)
    }

    pub fn fiat_amount(&self, amount_base_unit: &BigDecimal) -> BigDecimal {
        self.crypto_amount_precision(amount_base_unit) * &self.price
    }
}

fn icons_for(metadata: &OpportunityMetadata, assets: &AssetsById) -> Vec<String> {
    metadata
        .underlying_asset_ids
        .iter()
        .map(|asset_id| assets.get(asset_id).and_then(|a| a.icon.clone()).unwrap_or_default())
        .collect()
}

/// Shared inputs of the assembler
#[derive(Debug, Clone, Copy)]
pub struct ViewContext<'a> {
    pub catalog: &'a EarnCatalog,
    pub assets: &'a AssetsById,
    pub market_data: &'a MarketDataById,
}

impl ViewContext<'_> {
    /// Render a live position, valued at its current market price
    pub fn earn_view(
        &self,
        staking_id: &StakingId,
        metadata: &OpportunityMetadata,
        position: &UserStakingOpportunity,
    ) -> EarnOpportunityView {
        let valuation = Valuation::resolve(metadata, self.assets, self.market_data);
        let staked = &position.staked_amount_crypto_base_unit;
        self.assemble(
            staking_id,
            metadata,
            position.clone(),
            valuation.crypto_amount_precision(staked),
            valuation.fiat_amount(staked),
        )
    }

    /// Zero-valued view for an opportunity the wallet holds nothing in
    pub fn placeholder_view(&self, staking_id: &StakingId, metadata: &OpportunityMetadata) -> EarnOpportunityView {
        self.assemble(
            staking_id,
            metadata,
            UserStakingOpportunity::empty_for(metadata),
            BigDecimal::zero(),
            BigDecimal::zero(),
        )
    }

    fn assemble(
        &self,
        staking_id: &StakingId,
        metadata: &OpportunityMetadata,
        position: UserStakingOpportunity,
        crypto_amount_precision: BigDecimal,
        fiat_amount: BigDecimal,
    ) -> EarnOpportunityView {
        EarnOpportunityView {
            staking_id: staking_id.clone(),
            asset_id: metadata.asset_id.clone(),
            underlying_asset_id: metadata.underlying_asset_id().cloned(),
            underlying_asset_ids: metadata.underlying_asset_ids.clone(),
            reward_asset_ids: metadata.reward_asset_ids.clone(),
            opportunity_type: metadata.opportunity_type,
            display: DisplayFields::resolve(metadata, self.catalog),
            chain_id: metadata.asset_id.chain_id().to_string(),
            crypto_amount_base_unit: position.staked_amount_crypto_base_unit.clone(),
            staked_amount_crypto_base_unit: position.staked_amount_crypto_base_unit,
            rewards_amounts_crypto_base_unit: position.rewards_amounts_crypto_base_unit,
            crypto_amount_precision,
            fiat_amount,
            icons: icons_for(metadata, self.assets),
            opportunity_name: metadata.name.clone(),
            is_loaded: true,
        }
    }
}

/// Live views first, then placeholders, keeping one view per contract address
/// (or asset id when there is no contract). Expired opportunities survive only
/// while the wallet still has stake or rewards in them.
pub fn union_with_placeholders(
    live: &[EarnOpportunityView],
    placeholders: Vec<EarnOpportunityView>,
) -> Vec<EarnOpportunityView> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut union = Vec::with_capacity(live.len() + placeholders.len());
    for view in live.iter().cloned().chain(placeholders) {
        if seen.insert(view.dedupe_key().to_string()) {
            union.push(view);
        }
    }
    union.retain(|view| !view.is_expired() || view.has_position());
    union
}

/// Worth suggesting as a deposit: the wallet holds an underlying asset, the
/// opportunity is live, and nothing is deposited in it yet
pub fn is_eligible(view: &EarnOpportunityView, asset_balances: &HashMap<AssetId, BigDecimal>) -> bool {
    let holds_underlying = view
        .underlying_asset_ids
        .iter()
        .any(|asset_id| asset_balances.get(asset_id).is_some_and(math::is_positive));
    holds_underlying && !view.is_expired() && !math::is_positive(&view.fiat_amount)
}

pub fn eligible(
    views: &[EarnOpportunityView],
    asset_balances: &HashMap<AssetId, BigDecimal>,
) -> Vec<EarnOpportunityView> {
    let eligible: Vec<_> = views
        .iter()
        .filter(|view| is_eligible(view, asset_balances))
        .cloned()
        .collect();
    debug!(candidate_count = views.len(), eligible_count = eligible.len(), "Filtered eligible opportunities");
    eligible
}

/// Eligible opportunities sharing the same underlying assets
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibleOpportunityGroup {
    pub underlying_asset_ids: Vec<AssetId>,
    pub net_apy: Decimal,
    pub opportunity_ids: Vec<AssetId>,
}

/// Group by identical underlying asset lists, in order of first appearance
pub fn group_by_underlying_assets(views: &[EarnOpportunityView]) -> Vec<EligibleOpportunityGroup> {
    let mut groups: Vec<EligibleOpportunityGroup> = Vec::new();
    for view in views {
        let apy = view.display.apy.unwrap_or(Decimal::ZERO);
        match groups.iter_mut().find(|g| g.underlying_asset_ids == view.underlying_asset_ids) {
            Some(group) => {
                group.net_apy += apy;
                group.opportunity_ids.push(view.asset_id.clone());
            }
            None => groups.push(EligibleOpportunityGroup {
                underlying_asset_ids: view.underlying_asset_ids.clone(),
                net_apy: apy,
                opportunity_ids: vec![view.asset_id.clone()],
            }),
        }
    }
    groups
}

pub fn total_fiat_amount(views: &[EarnOpportunityView]) -> BigDecimal {
    views
        .iter()
        .fold(BigDecimal::zero(), |acc, view| acc + &view.fiat_amount)
}

/// An underlying asset of a position, with the share of the stake it represents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetWithBalance {
    #[serde(flatten)]
    pub asset: Asset,
    #[serde(with = "amount_string")]
    pub crypto_balance_precision: BigDecimal,
    pub icons: Vec<String>,
    #[serde(with = "amount_string")]
    pub allocation_percentage: BigDecimal,
}

/// Split a position into its underlying assets.
///
/// Each balance is `staked * (ratio_i / 10^precision_i) / 10^precision`, where the
/// ratio defaults to one and `precision` follows the `Valuation` fallback chain.
/// Underlying assets missing from the asset table are skipped.
pub fn underlying_assets_with_balances(
    metadata: &OpportunityMetadata,
    position: &UserStakingOpportunity,
    assets: &AssetsById,
    market_data: &MarketDataById,
) -> Vec<AssetWithBalance> {
    let valuation = Valuation::resolve(metadata, assets, market_data);
    let count = metadata.underlying_asset_ids.len();
    if count == 0 {
        return Vec::new();
    }
    let allocation_percentage = BigDecimal::one() / BigDecimal::from(count as u64);

    metadata
        .underlying_asset_ids
        .iter()
        .enumerate()
        .filter_map(|(i, asset_id)| {
            let asset = assets.get(asset_id)?;
            let ratio = metadata
                .underlying_asset_ratios_base_unit
                .get(i)
                .map(|ratio| math::from_base_unit(ratio, asset.precision.unwrap_or(0)))
                .unwrap_or_else(BigDecimal::one);
            let crypto_balance_precision =
                valuation.crypto_amount_precision(&(ratio * &position.staked_amount_crypto_base_unit));
            Some(AssetWithBalance {
                asset: asset.clone(),
                crypto_balance_precision,
                icons: vec![asset.icon.clone().unwrap_or_default()],
                allocation_percentage: allocation_percentage.clone(),
            })
        })
        .collect()
}
