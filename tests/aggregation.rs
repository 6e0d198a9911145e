mod common;

use bigdecimal::{BigDecimal, Zero};

use common::*;
use earn_opportunities::math::format_amount;
use earn_opportunities::opportunities::aggregate;
use earn_opportunities::opportunities::ids::UserStakingId;
use earn_opportunities::opportunities::types::{OpportunitiesFilter, UserStakingRecord};

fn record(account: &str, staked: &str, rewards: &[&str]) -> UserStakingRecord {
    UserStakingRecord {
        user_staking_id: user_staking_id(account, FARM_V4),
        metadata: metadata(FARM_V4, &[ETH, FOX], &[FOX, ETH]),
        position: position(staked, rewards),
    }
}

#[test]
fn composite_ids_round_trip_for_caip_accounts() {
    for (account, staking) in [(ACCOUNT_1, FARM_V4), (ACCOUNT_2, FARM_V1), ("cosmos:cosmoshub-4:cosmos1abc", "cosmos:cosmoshub-4/slip44:118")] {
        let id = user_staking_id(account, staking);
        assert_eq!(id.decompose(), (account_id(account), staking_id(staking)));
        let reparsed: UserStakingId = id.as_str().parse().unwrap();
        assert_eq!(reparsed, id);
    }
}

#[test]
fn active_ids_keep_store_order_and_drop_foreign_accounts() {
    let snapshot = farming_snapshot();
    let mut selectors = selectors();
    let active = selectors.active_user_staking_ids(&snapshot);
    assert_eq!(
        *active,
        vec![user_staking_id(ACCOUNT_1, FARM_V4), user_staking_id(ACCOUNT_2, FARM_V4)]
    );
    assert_eq!(selectors.active_user_staking_by_id(&snapshot).len(), 2);
}

#[test]
fn records_for_opportunity_carry_metadata_and_origin() {
    let snapshot = farming_snapshot();
    let mut selectors = selectors();
    let records = selectors.user_staking_from_staking_id(&snapshot, &OpportunitiesFilter::by_staking_id(staking_id(FARM_V4)));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].user_staking_id, user_staking_id(ACCOUNT_1, FARM_V4));
    assert_eq!(records[0].metadata.asset_id, asset_id(FARM_V4));
    assert_eq!(records[1].position.staked_amount_crypto_base_unit, amount("500000000000000000"));

    let none = selectors.user_staking_from_staking_id(&snapshot, &OpportunitiesFilter::by_staking_id(staking_id(FARM_V1)));
    assert!(none.is_empty());
    assert!(selectors.user_staking_from_staking_id(&snapshot, &OpportunitiesFilter::default()).is_empty());
}

#[test]
fn positions_without_metadata_are_filtered_out() {
    let mut snapshot = farming_snapshot();
    let orphan = "eip155:1/erc20:0x0000000000000000000000000000000000000bad";
    snapshot
        .upsert_user_staking([(user_staking_id(ACCOUNT_1, orphan), position("10", &[]))])
        .unwrap();
    let mut selectors = selectors();
    let records = selectors.user_staking_by_staking_id(&snapshot);
    assert_eq!(records.len(), 2);
    assert!(records.get(&staking_id(orphan)).is_empty());
    assert!(
        selectors
            .aggregated_by_staking_id(&snapshot, &OpportunitiesFilter::by_staking_id(staking_id(orphan)))
            .is_none()
    );
}

#[test]
fn aggregating_one_record_is_identity() {
    let single = record(ACCOUNT_1, "123", &["4", "5"]);
    let aggregated = aggregate::aggregate(std::slice::from_ref(&single)).unwrap();
    assert_eq!(aggregated.position, single.position);
    assert_eq!(aggregated.metadata, single.metadata);
    assert_eq!(aggregated.staking_id, staking_id(FARM_V4));
}

#[test]
fn aggregation_sums_beyond_float_precision() {
    let records = vec![
        record(ACCOUNT_1, "123456789012345678901234567", &["1", "999999999999999999999"]),
        record(ACCOUNT_2, "987654321098765432109876543", &["2", "1"]),
        record(FOREIGN_ACCOUNT, "1", &["3"]),
    ];
    let aggregated = aggregate::aggregate(&records).unwrap();
    assert_eq!(
        format_amount(&aggregated.position.staked_amount_crypto_base_unit),
        "1111111110111111111011111111"
    );
    let rewards: Vec<String> = aggregated.position.rewards_amounts_crypto_base_unit.iter().map(format_amount).collect();
    assert_eq!(rewards, vec!["6".to_string(), "1000000000000000000000".to_string()]);
}

#[test]
fn empty_aggregation_is_absent_not_zero() {
    assert!(aggregate::aggregate(&[]).is_none());

    let zero = aggregate::aggregate(&[record(ACCOUNT_1, "0", &[])]).unwrap();
    assert!(zero.position.staked_amount_crypto_base_unit.is_zero());
}

#[test]
fn aggregated_views_follow_store_order_and_skip_unheld() {
    let mut snapshot = farming_snapshot();
    snapshot
        .upsert_user_staking([(user_staking_id(ACCOUNT_2, FARM_V1), position("3", &["0"]))])
        .unwrap();
    let mut selectors = selectors();
    let aggregated = selectors.aggregated(&snapshot);
    let ids: Vec<_> = aggregated.iter().map(|a| a.staking_id.clone()).collect();
    assert_eq!(ids, vec![staking_id(FARM_V4), staking_id(FARM_V1)]);
    assert_eq!(aggregated[0].position.staked_amount_crypto_base_unit, amount("2000000000000000000"));
    assert_eq!(aggregated[0].position.rewards_amounts_crypto_base_unit.get(0), Some(&amount("50")));

    snapshot.set_wallet_account_ids(vec![account_id(ACCOUNT_1)]);
    let aggregated = selectors.aggregated(&snapshot);
    assert_eq!(aggregated.len(), 1);
    assert_eq!(aggregated[0].position.staked_amount_crypto_base_unit, amount("1500000000000000000"));
}

#[test]
fn highest_balance_account_prefers_largest_stake() {
    let snapshot = farming_snapshot();
    let mut selectors = selectors();
    let filter = OpportunitiesFilter::by_staking_id(staking_id(FARM_V4));
    // The foreign account holds more but is not part of the wallet
    assert_eq!(selectors.highest_balance_account_id(&snapshot, &filter), Some(account_id(ACCOUNT_1)));
    assert_eq!(
        selectors.highest_balance_account_id(&snapshot, &OpportunitiesFilter::by_staking_id(staking_id(FARM_V1))),
        None
    );
}

#[test]
fn position_lookup_defaults_to_zero_for_unheld_opportunity() {
    let snapshot = farming_snapshot();
    let mut selectors = selectors();
    let filter = OpportunitiesFilter::by_user_staking_id(user_staking_id(ACCOUNT_1, FARM_V1));
    let record = selectors.user_staking_by_user_staking_id(&snapshot, &filter).unwrap();
    assert!(record.position.staked_amount_crypto_base_unit.is_zero());
    assert_eq!(record.position.rewards_amounts_crypto_base_unit.len(), 1);
    assert_eq!(record.position.rewards_amounts_crypto_base_unit.get(0), Some(&BigDecimal::zero()));

    let unknown = OpportunitiesFilter::by_user_staking_id(user_staking_id(ACCOUNT_1, "eip155:1/erc20:0xdead"));
    assert!(selectors.user_staking_by_user_staking_id(&snapshot, &unknown).is_none());
    assert_eq!(
        selectors.staking_id_from_user_staking_id(&filter),
        Some(staking_id(FARM_V1))
    );
}

#[test]
fn by_account_index_tracks_upserts() {
    let snapshot = farming_snapshot();
    let selectors = selectors();
    assert_eq!(
        selectors.staking_account_ids(&snapshot),
        vec![account_id(ACCOUNT_1), account_id(ACCOUNT_2), account_id(FOREIGN_ACCOUNT)]
    );
    assert_eq!(
        selectors.staking_ids_by_account_id(&snapshot, &OpportunitiesFilter::by_account_id(account_id(ACCOUNT_2))),
        vec![staking_id(FARM_V4)]
    );
    assert!(selectors.staking_ids_by_account_id(&snapshot, &OpportunitiesFilter::default()).is_empty());
    assert_eq!(selectors.staking_ids(&snapshot), &[staking_id(FARM_V4), staking_id(FARM_V1)]);
}
