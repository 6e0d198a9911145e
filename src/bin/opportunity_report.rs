use std::sync::Arc;

use dotenvy::dotenv;
use serde::Serialize;
use tracing::{debug, info, instrument};

use earn_opportunities::config;
use earn_opportunities::logging;
use earn_opportunities::math;
use earn_opportunities::opportunities::catalog::EarnCatalog;
use earn_opportunities::opportunities::earn::{EarnOpportunityView, EligibleOpportunityGroup};
use earn_opportunities::opportunities::selectors::OpportunitySelectors;
use earn_opportunities::state::StoreSnapshot;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnReport<'a> {
    wallet_account_count: usize,
    total_fiat_amount: String,
    opportunities: &'a [EarnOpportunityView],
    eligible_groups: &'a [EligibleOpportunityGroup],
}

#[instrument(name = "opportunity_report_main")]
fn main() -> eyre::Result<()> {
    // Load environment variables from .env file, if present
    dotenv().ok();

    // Initialize logging
    if let Err(e) = logging::init_logging(env!("CARGO_BIN_NAME").to_string()) {
        eprintln!("Failed to initialize logging: {}", e);
        return Err(e);
    }

    // Load configuration
    let cfg = config::Config::load()?;
    info!(
        snapshot_path = %cfg.snapshot_path,
        earn_catalog_path = %cfg.earn_catalog_path,
        include_empty = cfg.include_empty,
        "Configuration loaded and logging initialized"
    );

    // Load static catalog and store snapshot
    let catalog = Arc::new(EarnCatalog::load_from_file(&cfg.earn_catalog_path)?);
    let snapshot = StoreSnapshot::load_from_file(&cfg.snapshot_path)?;

    let mut selectors = OpportunitySelectors::new(catalog);

    let opportunities = if cfg.include_empty {
        selectors.aggregated_earn_include_empty(&snapshot)
    } else {
        selectors.aggregated_earn(&snapshot)
    };
    let eligible_groups = selectors.eligible_grouped_by_underlying_assets(&snapshot);
    let total_fiat_amount = selectors.aggregated_earn_total_fiat(&snapshot);

    info!(
        opportunity_count = opportunities.len(),
        eligible_group_count = eligible_groups.len(),
        total_fiat_amount = %math::format_amount(&total_fiat_amount),
        "Earn opportunities computed"
    );
    for (selector, count) in selectors.recomputations() {
        debug!(selector, count, "Selector recomputations");
    }

    let report = EarnReport {
        wallet_account_count: snapshot.wallet_account_ids.len(),
        total_fiat_amount: math::format_amount(&total_fiat_amount),
        opportunities: &opportunities,
        eligible_groups: &eligible_groups,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
