pub mod assets;
pub mod opportunities;

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::OpportunityError;
use crate::math;
use crate::opportunities::ids::{AccountId, AssetId, StakingId, UserStakingId};
use crate::opportunities::types::{OpportunityMetadata, UserStakingOpportunity};
use assets::{Asset, AssetsById, MarketData, MarketDataById};
use opportunities::{StakingIdsByAccountId, StakingSlice, UserStakingSlice};

/// Immutable view of the normalized client state.
///
/// Every slice sits behind its own `Arc`. Cloning a snapshot is cheap, and an
/// upsert only swaps the slice it touches, so derived views keyed on slice
/// identity stay cached for everything else.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub staking: Arc<StakingSlice>,
    pub user_staking: Arc<UserStakingSlice>,
    pub staking_ids_by_account_id: Arc<StakingIdsByAccountId>,
    pub assets: Arc<AssetsById>,
    pub market_data: Arc<MarketDataById>,
    pub wallet_account_ids: Arc<Vec<AccountId>>,
    /// Wallet balances in base units
    pub asset_balances: Arc<HashMap<AssetId, BigDecimal>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    #[serde(default)]
    opportunities: OpportunitiesFile,
    #[serde(default)]
    assets: HashMap<AssetId, Asset>,
    #[serde(default)]
    market_data: HashMap<AssetId, MarketData>,
    #[serde(default)]
    portfolio: PortfolioFile,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpportunitiesFile {
    #[serde(default)]
    staking: StakingSlice,
    #[serde(default)]
    user_staking: UserStakingSlice,
    #[serde(default)]
    staking_ids_by_account_id: StakingIdsByAccountId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioFile {
    #[serde(default)]
    wallet_account_ids: Vec<AccountId>,
    #[serde(default)]
    asset_balances: HashMap<AssetId, String>,
}

impl StoreSnapshot {
    #[instrument(skip(json))]
    pub fn from_json_str(json: &str) -> Result<Self, OpportunityError> {
        let file: SnapshotFile = serde_json::from_str(json)?;

        let OpportunitiesFile { mut staking, mut user_staking, staking_ids_by_account_id } = file.opportunities;
        staking.normalize_ids();
        user_staking.normalize_ids();

        let asset_balances = file
            .portfolio
            .asset_balances
            .into_iter()
            .map(|(asset_id, raw)| Ok((asset_id, math::parse_amount(&raw)?)))
            .collect::<Result<HashMap<_, _>, OpportunityError>>()?;

        let snapshot = Self {
            staking: Arc::new(staking),
            user_staking: Arc::new(user_staking),
            staking_ids_by_account_id: Arc::new(staking_ids_by_account_id),
            assets: Arc::new(file.assets),
            market_data: Arc::new(file.market_data),
            wallet_account_ids: Arc::new(file.portfolio.wallet_account_ids),
            asset_balances: Arc::new(asset_balances),
        };
        snapshot.validate()?;

        info!(
            staking_count = snapshot.staking.ids.len(),
            user_staking_count = snapshot.user_staking.ids.len(),
            wallet_account_count = snapshot.wallet_account_ids.len(),
            asset_count = snapshot.assets.len(),
            "Store snapshot loaded"
        );
        Ok(snapshot)
    }

    #[instrument(fields(on_close = true))]
    pub fn load_from_file(path: &str) -> Result<Self, OpportunityError> {
        info!(file = %path, "Loading store snapshot from file");
        let content = fs::read_to_string(path).map_err(|source| OpportunityError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Every position's reward list is empty or matches its opportunity's reward assets
    pub fn validate(&self) -> Result<(), OpportunityError> {
        for (user_staking_id, position) in &self.user_staking.by_id {
            let staking_id = StakingId::new(user_staking_id.staking_part());
            let Some(metadata) = self.staking.get(&staking_id) else {
                debug!(%user_staking_id, "Position without metadata, it will be filtered out of views");
                continue;
            };
            check_reward_arity(user_staking_id, position, metadata)?;
        }
        Ok(())
    }

    /// Fails without touching the store when a known position no longer
    /// matches the reward assets its opportunity declares
    pub fn upsert_staking_metadata(
        &mut self,
        entries: impl IntoIterator<Item = (StakingId, OpportunityMetadata)>,
    ) -> Result<(), OpportunityError> {
        let entries: Vec<_> = entries.into_iter().collect();
        for (staking_id, metadata) in &entries {
            for (user_staking_id, position) in &self.user_staking.by_id {
                if user_staking_id.matches_staking_id(staking_id) {
                    check_reward_arity(user_staking_id, position, metadata)?;
                }
            }
        }
        Arc::make_mut(&mut self.staking).upsert(entries);
        Ok(())
    }

    pub fn upsert_user_staking(
        &mut self,
        entries: impl IntoIterator<Item = (UserStakingId, UserStakingOpportunity)>,
    ) -> Result<(), OpportunityError> {
        let entries: Vec<_> = entries.into_iter().collect();
        for (user_staking_id, position) in &entries {
            if let Some(metadata) = self.staking.get(&StakingId::new(user_staking_id.staking_part())) {
                check_reward_arity(user_staking_id, position, metadata)?;
            }
        }
        let by_account = Arc::make_mut(&mut self.staking_ids_by_account_id);
        for (user_staking_id, _) in &entries {
            let (account_id, staking_id) = user_staking_id.decompose();
            let staking_ids = by_account.entry(account_id).or_default();
            if !staking_ids.contains(&staking_id) {
                staking_ids.push(staking_id);
            }
        }
        Arc::make_mut(&mut self.user_staking).upsert(entries);
        Ok(())
    }

    pub fn set_wallet_account_ids(&mut self, account_ids: Vec<AccountId>) {
        self.wallet_account_ids = Arc::new(account_ids);
    }

    pub fn upsert_assets(&mut self, assets: impl IntoIterator<Item = Asset>) {
        let by_id = Arc::make_mut(&mut self.assets);
        for asset in assets {
            by_id.insert(asset.asset_id.clone(), asset);
        }
    }

    pub fn upsert_market_data(&mut self, entries: impl IntoIterator<Item = (AssetId, MarketData)>) {
        Arc::make_mut(&mut self.market_data).extend(entries);
    }

    pub fn upsert_asset_balances(&mut self, entries: impl IntoIterator<Item = (AssetId, BigDecimal)>) {
        Arc::make_mut(&mut self.asset_balances).extend(entries);
    }
}

fn check_reward_arity(
    user_staking_id: &UserStakingId,
    position: &UserStakingOpportunity,
    metadata: &OpportunityMetadata,
) -> Result<(), OpportunityError> {
    let actual = position.rewards_amounts_crypto_base_unit.len();
    let expected = metadata.reward_asset_ids.len();
    if actual != 0 && actual != expected {
        return Err(OpportunityError::RewardArityMismatch {
            user_staking_id: user_staking_id.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
