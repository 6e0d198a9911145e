use bigdecimal::{BigDecimal, Zero};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, AssetId, StakingId, UserStakingId};
use crate::error::OpportunityError;
use crate::math::{self, amount_string, amount_string_vec};

/// Maximum number of reward assets an opportunity can declare
pub const MAX_REWARD_ASSETS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityType {
    #[default]
    Staking,
    LiquidityPool,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staking => "staking",
            Self::LiquidityPool => "liquidity_pool",
        }
    }
}

/// Reference data for one opportunity, refreshed wholesale from upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityMetadata {
    pub asset_id: AssetId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_asset_id: Option<AssetId>,
    pub underlying_asset_ids: Vec<AssetId>,
    #[serde(default, with = "amount_string_vec")]
    pub underlying_asset_ratios_base_unit: Vec<BigDecimal>,
    #[serde(default)]
    pub reward_asset_ids: Vec<AssetId>,
    #[serde(default)]
    pub provider: String,
    #[serde(default, rename = "type")]
    pub opportunity_type: OpportunityType,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apy: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tvl: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expired: Option<bool>,
}

impl OpportunityMetadata {
    /// Explicit underlying asset, else the first of the underlying asset list
    pub fn underlying_asset_id(&self) -> Option<&AssetId> {
        self.underlying_asset_id.as_ref().or_else(|| self.underlying_asset_ids.first())
    }

    pub fn is_expired(&self) -> bool {
        self.expired.unwrap_or(false)
    }
}

/// Reward amounts in base units, positionally aligned with the opportunity's reward asset ids
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewardAmounts(Vec<BigDecimal>);

impl RewardAmounts {
    pub fn new(amounts: Vec<BigDecimal>) -> Result<Self, OpportunityError> {
        if amounts.len() > MAX_REWARD_ASSETS {
            return Err(OpportunityError::TooManyRewards(amounts.len()));
        }
        Ok(Self(amounts))
    }

    /// Zeroed amounts, one per declared reward asset
    pub fn zeroed(reward_asset_count: usize) -> Self {
        Self(vec![BigDecimal::zero(); reward_asset_count.min(MAX_REWARD_ASSETS)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BigDecimal> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BigDecimal> {
        self.0.iter()
    }

    pub fn any_positive(&self) -> bool {
        self.0.iter().any(math::is_positive)
    }

    /// Positional sum; a position missing on either side counts as zero
    pub fn positional_sum(&self, other: &Self) -> Self {
        let len = self.0.len().max(other.0.len());
        let zero = BigDecimal::zero();
        Self(
            (0..len)
                .map(|i| self.0.get(i).unwrap_or(&zero) + other.0.get(i).unwrap_or(&zero))
                .collect(),
        )
    }
}

impl TryFrom<Vec<String>> for RewardAmounts {
    type Error = OpportunityError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let amounts = value
            .iter()
            .map(|raw| math::parse_amount(raw))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(amounts)
    }
}

impl Serialize for RewardAmounts {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        amount_string_vec::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for RewardAmounts {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// One account's live position in one opportunity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStakingOpportunity {
    #[serde(default = "BigDecimal::zero", with = "amount_string")]
    pub staked_amount_crypto_base_unit: BigDecimal,
    #[serde(default)]
    pub rewards_amounts_crypto_base_unit: RewardAmounts,
}

impl UserStakingOpportunity {
    /// Zero stake with zeroed rewards aligned to the opportunity's reward assets
    pub fn empty_for(metadata: &OpportunityMetadata) -> Self {
        Self {
            staked_amount_crypto_base_unit: BigDecimal::zero(),
            rewards_amounts_crypto_base_unit: RewardAmounts::zeroed(metadata.reward_asset_ids.len()),
        }
    }

    pub fn has_balance(&self) -> bool {
        math::is_positive(&self.staked_amount_crypto_base_unit)
            || self.rewards_amounts_crypto_base_unit.any_positive()
    }
}

/// A position joined with its opportunity metadata, tagged with the composite id it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStakingRecord {
    pub user_staking_id: UserStakingId,
    #[serde(flatten)]
    pub metadata: OpportunityMetadata,
    #[serde(flatten)]
    pub position: UserStakingOpportunity,
}

/// Positions of every active account in one opportunity folded into one
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedOpportunity {
    pub staking_id: StakingId,
    #[serde(flatten)]
    pub metadata: OpportunityMetadata,
    #[serde(flatten)]
    pub position: UserStakingOpportunity,
}

/// Parameters of a filtered query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunitiesFilter {
    pub account_id: Option<AccountId>,
    pub staking_id: Option<StakingId>,
    pub user_staking_id: Option<UserStakingId>,
}

impl OpportunitiesFilter {
    pub fn by_account_id(account_id: AccountId) -> Self {
        Self { account_id: Some(account_id), ..Default::default() }
    }

    pub fn by_staking_id(staking_id: StakingId) -> Self {
        Self { staking_id: Some(staking_id), ..Default::default() }
    }

    pub fn by_user_staking_id(user_staking_id: UserStakingId) -> Self {
        Self { user_staking_id: Some(user_staking_id), ..Default::default() }
    }
}
