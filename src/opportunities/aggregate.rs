// Joins and folds over the normalized store. Everything here is pure; caching lives in `selectors`.
use std::collections::{HashMap, HashSet};

use bigdecimal::BigDecimal;
use tracing::debug;

use super::ids::{AccountId, StakingId, UserStakingId};
use super::types::{AggregatedOpportunity, UserStakingOpportunity, UserStakingRecord};
use crate::state::opportunities::{StakingSlice, UserStakingSlice};

/// Composite ids whose account belongs to the wallet, in store order
pub fn active_user_staking_ids(
    wallet_account_ids: &[AccountId],
    user_staking: &UserStakingSlice,
) -> Vec<UserStakingId> {
    let wallet: HashSet<&str> = wallet_account_ids.iter().map(AccountId::as_str).collect();
    user_staking
        .ids
        .iter()
        .filter(|id| wallet.contains(id.account_part()))
        .cloned()
        .collect()
}

pub fn active_user_staking_by_id(
    wallet_account_ids: &[AccountId],
    user_staking: &UserStakingSlice,
) -> HashMap<UserStakingId, UserStakingOpportunity> {
    let wallet: HashSet<&str> = wallet_account_ids.iter().map(AccountId::as_str).collect();
    user_staking
        .by_id
        .iter()
        .filter(|(id, _)| wallet.contains(id.account_part()))
        .map(|(id, position)| (id.clone(), position.clone()))
        .collect()
}

/// Every active position in `staking_id`, joined with the opportunity's metadata.
///
/// Positions without metadata, or ids missing from the position map, are dropped.
pub fn user_staking_records_for(
    staking_id: &StakingId,
    active_ids: &[UserStakingId],
    user_staking: &UserStakingSlice,
    staking: &StakingSlice,
) -> Vec<UserStakingRecord> {
    let Some(metadata) = staking.get(staking_id) else {
        return Vec::new();
    };
    active_ids
        .iter()
        .filter(|id| id.matches_staking_id(staking_id))
        .filter_map(|id| {
            let position = user_staking.get(id)?;
            Some(UserStakingRecord {
                user_staking_id: id.clone(),
                metadata: metadata.clone(),
                position: position.clone(),
            })
        })
        .collect()
}

/// Records of every known opportunity, keyed by staking id and kept in store order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsByStakingId {
    order: Vec<StakingId>,
    by_id: HashMap<StakingId, Vec<UserStakingRecord>>,
}

impl RecordsByStakingId {
    pub fn build(active_ids: &[UserStakingId], user_staking: &UserStakingSlice, staking: &StakingSlice) -> Self {
        let mut records = Self::default();
        for staking_id in &staking.ids {
            if records.by_id.contains_key(staking_id) {
                continue;
            }
            let for_opportunity = user_staking_records_for(staking_id, active_ids, user_staking, staking);
            records.order.push(staking_id.clone());
            records.by_id.insert(staking_id.clone(), for_opportunity);
        }
        records
    }

    /// Empty when the opportunity is unknown or has no active holders
    pub fn get(&self, staking_id: &StakingId) -> &[UserStakingRecord] {
        self.by_id.get(staking_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StakingId, &[UserStakingRecord])> {
        self.order
            .iter()
            .map(|staking_id| (staking_id, self.get(staking_id)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Fold positions of one opportunity across accounts.
///
/// Stake and rewards are summed exactly; the composite id is dropped. An empty
/// slice yields `None`, which is distinct from an aggregate of zero balances.
pub fn aggregate(records: &[UserStakingRecord]) -> Option<AggregatedOpportunity> {
    let (first, rest) = records.split_first()?;
    let (_, staking_id) = first.user_staking_id.decompose();
    let mut position = first.position.clone();
    for record in rest {
        position = UserStakingOpportunity {
            staked_amount_crypto_base_unit: &position.staked_amount_crypto_base_unit
                + &record.position.staked_amount_crypto_base_unit,
            rewards_amounts_crypto_base_unit: position
                .rewards_amounts_crypto_base_unit
                .positional_sum(&record.position.rewards_amounts_crypto_base_unit),
        };
    }
    // Every record of one opportunity carries the same metadata
    let metadata = first.metadata.clone();
    Some(AggregatedOpportunity { staking_id, metadata, position })
}

/// `aggregate` applied per opportunity, skipping opportunities without active holders
pub fn aggregate_across_opportunities(records: &RecordsByStakingId) -> Vec<AggregatedOpportunity> {
    let aggregated: Vec<_> = records
        .iter()
        .filter_map(|(_, for_opportunity)| aggregate(for_opportunity))
        .collect();
    debug!(
        opportunity_count = records.len(),
        aggregated_count = aggregated.len(),
        "Aggregated positions across opportunities"
    );
    aggregated
}

/// Active account with the largest stake in `staking_id`; the first in store order wins ties
pub fn highest_balance_account_id(
    staking_id: &StakingId,
    active_ids: &[UserStakingId],
    user_staking: &UserStakingSlice,
) -> Option<AccountId> {
    let mut best: Option<(&UserStakingId, &BigDecimal)> = None;
    for id in active_ids.iter().filter(|id| id.matches_staking_id(staking_id)) {
        let Some(position) = user_staking.get(id) else {
            continue;
        };
        let staked = &position.staked_amount_crypto_base_unit;
        if best.is_none_or(|(_, current)| staked > current) {
            best = Some((id, staked));
        }
    }
    best.map(|(id, _)| id.decompose().0)
}
