use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::opportunities::ids::{AccountId, StakingId, UserStakingId};
use crate::opportunities::types::{OpportunityMetadata, UserStakingOpportunity};

/// Opportunity metadata keyed by staking id; `ids` carries iteration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakingSlice {
    #[serde(default)]
    pub ids: Vec<StakingId>,
    #[serde(default)]
    pub by_id: HashMap<StakingId, OpportunityMetadata>,
}

/// Per-account positions keyed by composite id; `ids` carries iteration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStakingSlice {
    #[serde(default)]
    pub ids: Vec<UserStakingId>,
    #[serde(default)]
    pub by_id: HashMap<UserStakingId, UserStakingOpportunity>,
}

pub type StakingIdsByAccountId = HashMap<AccountId, Vec<StakingId>>;

impl StakingSlice {
    pub fn get(&self, staking_id: &StakingId) -> Option<&OpportunityMetadata> {
        self.by_id.get(staking_id)
    }

    /// Insert or replace metadata, appending unseen ids after the existing ones
    pub fn upsert(&mut self, entries: impl IntoIterator<Item = (StakingId, OpportunityMetadata)>) {
        for (staking_id, metadata) in entries {
            if self.by_id.insert(staking_id.clone(), metadata).is_none() {
                self.ids.push(staking_id);
            }
        }
    }

    pub(crate) fn normalize_ids(&mut self) {
        normalize_ids(&mut self.ids, &self.by_id);
    }
}

impl UserStakingSlice {
    pub fn get(&self, user_staking_id: &UserStakingId) -> Option<&UserStakingOpportunity> {
        self.by_id.get(user_staking_id)
    }

    pub fn upsert(&mut self, entries: impl IntoIterator<Item = (UserStakingId, UserStakingOpportunity)>) {
        for (user_staking_id, position) in entries {
            if self.by_id.insert(user_staking_id.clone(), position).is_none() {
                self.ids.push(user_staking_id);
            }
        }
    }

    pub(crate) fn normalize_ids(&mut self) {
        normalize_ids(&mut self.ids, &self.by_id);
    }
}

// Repeated ids keep their first position; keys present in `by_id` but not
// listed in `ids` are appended in sorted order
fn normalize_ids<K: Clone + Ord + Hash + Eq, V>(ids: &mut Vec<K>, by_id: &HashMap<K, V>) {
    let mut seen: HashSet<K> = HashSet::with_capacity(ids.len());
    ids.retain(|id| seen.insert(id.clone()));
    let mut missing: Vec<K> = by_id.keys().filter(|k| !seen.contains(*k)).cloned().collect();
    missing.sort();
    ids.extend(missing);
}
