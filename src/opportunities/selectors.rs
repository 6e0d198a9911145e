use std::collections::HashMap;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use tracing::{debug, instrument};

use super::aggregate::{self, RecordsByStakingId};
use super::catalog::EarnCatalog;
use super::earn::{self, AssetWithBalance, EarnOpportunityView, EligibleOpportunityGroup, ViewContext};
use super::ids::{AccountId, AssetId, StakingId, UserStakingId};
use super::types::{AggregatedOpportunity, OpportunitiesFilter, UserStakingOpportunity, UserStakingRecord};
use crate::memo::{ByRef, Memo};
use crate::state::StoreSnapshot;
use crate::state::assets::{AssetsById, MarketDataById};
use crate::state::opportunities::{StakingSlice, UserStakingSlice};

type ActiveKey = (ByRef<Vec<AccountId>>, ByRef<UserStakingSlice>);
type JoinKey = (ByRef<Vec<AccountId>>, ByRef<UserStakingSlice>, ByRef<StakingSlice>);
type ViewKey = (JoinKey, ByRef<AssetsById>, ByRef<MarketDataById>);
type EligibleKey = (ViewKey, ByRef<HashMap<AssetId, BigDecimal>>);

fn active_key(snapshot: &StoreSnapshot) -> ActiveKey {
    (ByRef::new(&snapshot.wallet_account_ids), ByRef::new(&snapshot.user_staking))
}

fn join_key(snapshot: &StoreSnapshot) -> JoinKey {
    (
        ByRef::new(&snapshot.wallet_account_ids),
        ByRef::new(&snapshot.user_staking),
        ByRef::new(&snapshot.staking),
    )
}

fn view_key(snapshot: &StoreSnapshot) -> ViewKey {
    (join_key(snapshot), ByRef::new(&snapshot.assets), ByRef::new(&snapshot.market_data))
}

fn eligible_key(snapshot: &StoreSnapshot) -> EligibleKey {
    (view_key(snapshot), ByRef::new(&snapshot.asset_balances))
}

/// Derived views over a [`StoreSnapshot`].
///
/// Each cached selector remembers its last result, keyed on the identity of
/// the slices it reads (plus its filter parameter where it takes one). Pass
/// successive snapshots in; only views whose inputs changed are recomputed.
#[derive(Debug)]
pub struct OpportunitySelectors {
    catalog: Arc<EarnCatalog>,
    active_user_staking_ids: Memo<ActiveKey, Vec<UserStakingId>>,
    active_user_staking_by_id: Memo<ActiveKey, HashMap<UserStakingId, UserStakingOpportunity>>,
    user_staking_by_staking_id: Memo<JoinKey, RecordsByStakingId>,
    aggregated: Memo<JoinKey, Vec<AggregatedOpportunity>>,
    aggregated_by_staking_id: Memo<(JoinKey, Option<StakingId>), Option<AggregatedOpportunity>>,
    aggregated_earn: Memo<ViewKey, Vec<EarnOpportunityView>>,
    aggregated_earn_include_empty: Memo<ViewKey, Vec<EarnOpportunityView>>,
    eligible: Memo<EligibleKey, Vec<EarnOpportunityView>>,
}

impl OpportunitySelectors {
    pub fn new(catalog: Arc<EarnCatalog>) -> Self {
        Self {
            catalog,
            active_user_staking_ids: Memo::new("active_user_staking_ids"),
            active_user_staking_by_id: Memo::new("active_user_staking_by_id"),
            user_staking_by_staking_id: Memo::new("user_staking_by_staking_id"),
            aggregated: Memo::new("aggregated"),
            aggregated_by_staking_id: Memo::new("aggregated_by_staking_id"),
            aggregated_earn: Memo::new("aggregated_earn"),
            aggregated_earn_include_empty: Memo::new("aggregated_earn_include_empty"),
            eligible: Memo::new("eligible"),
        }
    }

    pub fn catalog(&self) -> &EarnCatalog {
        &self.catalog
    }

    fn view_context<'a>(&'a self, snapshot: &'a StoreSnapshot) -> ViewContext<'a> {
        ViewContext {
            catalog: &self.catalog,
            assets: &snapshot.assets,
            market_data: &snapshot.market_data,
        }
    }

    pub fn staking_ids<'a>(&self, snapshot: &'a StoreSnapshot) -> &'a [StakingId] {
        &snapshot.staking.ids
    }

    /// Accounts present in the by-account index, sorted
    pub fn staking_account_ids(&self, snapshot: &StoreSnapshot) -> Vec<AccountId> {
        let mut account_ids: Vec<AccountId> = snapshot.staking_ids_by_account_id.keys().cloned().collect();
        account_ids.sort();
        account_ids
    }

    /// Opportunities the filter's account has a position in
    pub fn staking_ids_by_account_id(&self, snapshot: &StoreSnapshot, filter: &OpportunitiesFilter) -> Vec<StakingId> {
        filter
            .account_id
            .as_ref()
            .and_then(|account_id| snapshot.staking_ids_by_account_id.get(account_id))
            .cloned()
            .unwrap_or_default()
    }

    pub fn staking_id_from_user_staking_id(&self, filter: &OpportunitiesFilter) -> Option<StakingId> {
        filter.user_staking_id.as_ref().map(|id| id.decompose().1)
    }

    /// Composite ids belonging to the active wallet, in store order
    pub fn active_user_staking_ids(&mut self, snapshot: &StoreSnapshot) -> Arc<Vec<UserStakingId>> {
        self.active_user_staking_ids.get_or_compute(active_key(snapshot), || {
            aggregate::active_user_staking_ids(&snapshot.wallet_account_ids, &snapshot.user_staking)
        })
    }

    pub fn active_user_staking_by_id(
        &mut self,
        snapshot: &StoreSnapshot,
    ) -> Arc<HashMap<UserStakingId, UserStakingOpportunity>> {
        self.active_user_staking_by_id.get_or_compute(active_key(snapshot), || {
            aggregate::active_user_staking_by_id(&snapshot.wallet_account_ids, &snapshot.user_staking)
        })
    }

    /// One account's position merged with its metadata.
    ///
    /// An account without a position gets zero stake and zeroed rewards; unknown
    /// metadata yields `None`.
    pub fn user_staking_by_user_staking_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<UserStakingRecord> {
        let user_staking_id = filter.user_staking_id.as_ref()?;
        let staking_id = StakingId::new(user_staking_id.staking_part());
        let metadata = snapshot.staking.get(&staking_id)?;
        let active = self.active_user_staking_by_id(snapshot);
        let position = active
            .get(user_staking_id)
            .cloned()
            .unwrap_or_else(|| UserStakingOpportunity::empty_for(metadata));
        Some(UserStakingRecord {
            user_staking_id: user_staking_id.clone(),
            metadata: metadata.clone(),
            position,
        })
    }

    /// Active records of every opportunity, keyed by staking id
    #[instrument(skip_all)]
    pub fn user_staking_by_staking_id(&mut self, snapshot: &StoreSnapshot) -> Arc<RecordsByStakingId> {
        let active_ids = self.active_user_staking_ids(snapshot);
        self.user_staking_by_staking_id.get_or_compute(join_key(snapshot), || {
            RecordsByStakingId::build(&active_ids, &snapshot.user_staking, &snapshot.staking)
        })
    }

    /// Active records of the filter's opportunity; empty without holders
    pub fn user_staking_from_staking_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Vec<UserStakingRecord> {
        let Some(staking_id) = filter.staking_id.as_ref() else {
            return Vec::new();
        };
        let active_ids = self.active_user_staking_ids(snapshot);
        aggregate::user_staking_records_for(staking_id, &active_ids, &snapshot.user_staking, &snapshot.staking)
    }

    #[instrument(skip(self, snapshot), fields(staking_id = ?filter.staking_id))]
    pub fn aggregated_by_staking_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<AggregatedOpportunity> {
        let records = self.user_staking_by_staking_id(snapshot);
        let key = (join_key(snapshot), filter.staking_id.clone());
        let aggregated = self.aggregated_by_staking_id.get_or_compute(key, || {
            filter
                .staking_id
                .as_ref()
                .and_then(|staking_id| aggregate::aggregate(records.get(staking_id)))
        });
        (*aggregated).clone()
    }

    /// Every opportunity with at least one active holder, folded across accounts
    #[instrument(skip_all, fields(on_close = true))]
    pub fn aggregated(&mut self, snapshot: &StoreSnapshot) -> Arc<Vec<AggregatedOpportunity>> {
        let records = self.user_staking_by_staking_id(snapshot);
        self.aggregated
            .get_or_compute(join_key(snapshot), || aggregate::aggregate_across_opportunities(&records))
    }

    pub fn aggregated_earn_by_staking_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<EarnOpportunityView> {
        let opportunity = self.aggregated_by_staking_id(snapshot, filter)?;
        Some(self.view_context(snapshot).earn_view(
            &opportunity.staking_id,
            &opportunity.metadata,
            &opportunity.position,
        ))
    }

    #[instrument(skip_all, fields(on_close = true))]
    pub fn aggregated_earn(&mut self, snapshot: &StoreSnapshot) -> Arc<Vec<EarnOpportunityView>> {
        let aggregated = self.aggregated(snapshot);
        let ctx = ViewContext {
            catalog: &self.catalog,
            assets: &snapshot.assets,
            market_data: &snapshot.market_data,
        };
        self.aggregated_earn.get_or_compute(view_key(snapshot), || {
            aggregated
                .iter()
                .map(|opportunity| ctx.earn_view(&opportunity.staking_id, &opportunity.metadata, &opportunity.position))
                .collect()
        })
    }

    /// Live aggregated views plus a zero-valued view for every other known opportunity
    #[instrument(skip_all, fields(on_close = true))]
    pub fn aggregated_earn_include_empty(&mut self, snapshot: &StoreSnapshot) -> Arc<Vec<EarnOpportunityView>> {
        let live = self.aggregated_earn(snapshot);
        let ctx = ViewContext {
            catalog: &self.catalog,
            assets: &snapshot.assets,
            market_data: &snapshot.market_data,
        };
        self.aggregated_earn_include_empty.get_or_compute(view_key(snapshot), || {
            let placeholders: Vec<_> = snapshot
                .staking
                .ids
                .iter()
                .filter_map(|staking_id| {
                    let metadata = snapshot.staking.get(staking_id)?;
                    Some(ctx.placeholder_view(staking_id, metadata))
                })
                .collect();
            let union = earn::union_with_placeholders(&live, placeholders);
            debug!(live_count = live.len(), union_count = union.len(), "Merged placeholder views");
            union
        })
    }

    /// Sum of fiat value over every live aggregated view
    pub fn aggregated_earn_total_fiat(&mut self, snapshot: &StoreSnapshot) -> BigDecimal {
        earn::total_fiat_amount(&self.aggregated_earn(snapshot))
    }

    /// One account's position rendered as an earn view
    pub fn earn_by_user_staking_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<EarnOpportunityView> {
        let record = self.user_staking_by_user_staking_id(snapshot, filter)?;
        let (_, staking_id) = record.user_staking_id.decompose();
        Some(self.view_context(snapshot).earn_view(&staking_id, &record.metadata, &record.position))
    }

    /// Deposit suggestions drawn from the include-empty views
    #[instrument(skip_all)]
    pub fn eligible(&mut self, snapshot: &StoreSnapshot) -> Arc<Vec<EarnOpportunityView>> {
        let candidates = self.aggregated_earn_include_empty(snapshot);
        self.eligible.get_or_compute(eligible_key(snapshot), || {
            earn::eligible(&candidates, &snapshot.asset_balances)
        })
    }

    pub fn eligible_grouped_by_underlying_assets(&mut self, snapshot: &StoreSnapshot) -> Vec<EligibleOpportunityGroup> {
        earn::group_by_underlying_assets(&self.eligible(snapshot))
    }

    /// The active account holding the most of the filter's opportunity
    pub fn highest_balance_account_id(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<AccountId> {
        let staking_id = filter.staking_id.as_ref()?;
        let active_ids = self.active_user_staking_ids(snapshot);
        aggregate::highest_balance_account_id(staking_id, &active_ids, &snapshot.user_staking)
    }

    pub fn underlying_assets_with_balances(
        &mut self,
        snapshot: &StoreSnapshot,
        filter: &OpportunitiesFilter,
    ) -> Option<Vec<AssetWithBalance>> {
        let record = self.user_staking_by_user_staking_id(snapshot, filter)?;
        Some(earn::underlying_assets_with_balances(
            &record.metadata,
            &record.position,
            &snapshot.assets,
            &snapshot.market_data,
        ))
    }

    /// Recomputation counts per cached selector, for diagnostics
    pub fn recomputations(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("active_user_staking_ids", self.active_user_staking_ids.recomputations()),
            ("active_user_staking_by_id", self.active_user_staking_by_id.recomputations()),
            ("user_staking_by_staking_id", self.user_staking_by_staking_id.recomputations()),
            ("aggregated", self.aggregated.recomputations()),
            ("aggregated_by_staking_id", self.aggregated_by_staking_id.recomputations()),
            ("aggregated_earn", self.aggregated_earn.recomputations()),
            ("aggregated_earn_include_empty", self.aggregated_earn_include_empty.recomputations()),
            ("eligible", self.eligible.recomputations()),
        ]
    }
}
