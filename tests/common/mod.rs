#![allow(dead_code)]

use std::sync::Arc;

use bigdecimal::BigDecimal;
use rust_decimal::Decimal;

use earn_opportunities::math::parse_amount;
use earn_opportunities::opportunities::catalog::EarnCatalog;
use earn_opportunities::opportunities::ids::{AccountId, AssetId, StakingId, UserStakingId};
use earn_opportunities::opportunities::selectors::OpportunitySelectors;
use earn_opportunities::opportunities::types::{OpportunityMetadata, OpportunityType, RewardAmounts, UserStakingOpportunity};
use earn_opportunities::state::StoreSnapshot;
use earn_opportunities::state::assets::{Asset, MarketData};

pub const ETH: &str = "eip155:1/slip44:60";
pub const FOX: &str = "eip155:1/erc20:0xc770eefad204b5180df6a14ee197d99d808ee52d";
pub const LP: &str = "eip155:1/erc20:0x470e8de2ebaef52014a47cb5e6af86884947f08c";
pub const FARM_V4: &str = "eip155:1/erc20:0xc54b9f82c1c54e9d4d274d633c7523f2299c42a0";
pub const FARM_V1: &str = "eip155:1/erc20:0x212ebf9fd3c10f371557b08e993eaab385c3932b";

pub const ACCOUNT_1: &str = "eip155:1:0x1111111111111111111111111111111111111111";
pub const ACCOUNT_2: &str = "eip155:1:0x2222222222222222222222222222222222222222";
pub const FOREIGN_ACCOUNT: &str = "eip155:1:0x9999999999999999999999999999999999999999";

pub fn asset_id(value: &str) -> AssetId {
    value.parse().unwrap()
}

pub fn staking_id(value: &str) -> StakingId {
    StakingId::from(value)
}

pub fn account_id(value: &str) -> AccountId {
    AccountId::from(value)
}

pub fn user_staking_id(account: &str, staking: &str) -> UserStakingId {
    UserStakingId::compose(&account_id(account), &staking_id(staking))
}

pub fn amount(value: &str) -> BigDecimal {
    parse_amount(value).unwrap()
}

pub fn metadata(asset: &str, underlying: &[&str], rewards: &[&str]) -> OpportunityMetadata {
    OpportunityMetadata {
        asset_id: asset_id(asset),
        underlying_asset_id: None,
        underlying_asset_ids: underlying.iter().map(|id| asset_id(id)).collect(),
        underlying_asset_ratios_base_unit: Vec::new(),
        reward_asset_ids: rewards.iter().map(|id| asset_id(id)).collect(),
        provider: "ShapeShift".to_string(),
        opportunity_type: OpportunityType::Staking,
        name: format!("Opportunity {}", &asset[asset.len() - 4..]),
        apy: Some(Decimal::new(5, 2)),
        tvl: Some(Decimal::ZERO),
        expired: None,
    }
}

pub fn position(staked: &str, rewards: &[&str]) -> UserStakingOpportunity {
    UserStakingOpportunity {
        staked_amount_crypto_base_unit: amount(staked),
        rewards_amounts_crypto_base_unit: RewardAmounts::new(rewards.iter().map(|r| amount(r)).collect()).unwrap(),
    }
}

pub fn asset(id: &str, precision: Option<u32>) -> Asset {
    Asset {
        asset_id: asset_id(id),
        name: id.to_string(),
        symbol: String::new(),
        precision,
        icon: Some(format!("icon:{}", id)),
    }
}

pub fn price(value: &str) -> MarketData {
    MarketData { price: amount(value) }
}

pub fn selectors() -> OpportunitySelectors {
    OpportunitySelectors::new(Arc::new(EarnCatalog::default()))
}

/// Two accounts in FARM_V4 (FOX rewards), nobody in FARM_V1, one foreign account in FARM_V4
pub fn farming_snapshot() -> StoreSnapshot {
    let mut snapshot = StoreSnapshot::default();
    snapshot.upsert_staking_metadata([
        (staking_id(FARM_V4), metadata(FARM_V4, &[ETH, FOX], &[FOX])),
        (staking_id(FARM_V1), metadata(FARM_V1, &[ETH, FOX], &[FOX])),
    ])
    .unwrap();
    snapshot
        .upsert_user_staking([
            (user_staking_id(ACCOUNT_1, FARM_V4), position("1500000000000000000", &["42"])),
            (user_staking_id(FOREIGN_ACCOUNT, FARM_V4), position("7000000000000000000", &["1"])),
            (user_staking_id(ACCOUNT_2, FARM_V4), position("500000000000000000", &["8"])),
        ])
        .unwrap();
    snapshot.upsert_assets([asset(ETH, Some(18)), asset(FOX, Some(18)), asset(FARM_V4, Some(18))]);
    snapshot.upsert_market_data([(asset_id(FARM_V4), price("80")), (asset_id(FOX), price("0.5"))]);
    snapshot.set_wallet_account_ids(vec![account_id(ACCOUNT_1), account_id(ACCOUNT_2)]);
    snapshot
}
