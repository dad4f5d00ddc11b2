use std::path::Path;

use archon_core::pipeline::kpi::{
    status_breakdown, PipelineAggregator, PipelineKpis, StatusBucket,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::commands::{load_config, read_snapshot, resolve_now, CommandResult};

#[derive(Debug, Serialize)]
struct KpiReport {
    now: DateTime<Utc>,
    expiring_soon_days: u32,
    kpis: PipelineKpis,
    breakdown: Vec<StatusBucket>,
}

pub fn run(input: &Path, now: Option<&str>) -> CommandResult {
    let config = match load_config("kpis") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let now = match resolve_now("kpis", now) {
        Ok(now) => now,
        Err(result) => return result,
    };
    let snapshot = match read_snapshot("kpis", input) {
        Ok(snapshot) => snapshot,
        Err(result) => return result,
    };

    let quotes: Vec<_> = snapshot.quotes.into_iter().filter(|quote| !quote.archived).collect();
    let aggregator = PipelineAggregator::new(config.pipeline.settings());
    let kpis = aggregator.compute(&quotes, now);
    tracing::info!(
        event_name = "pipeline.kpis_computed",
        quotes = quotes.len(),
        active = kpis.count,
        "pipeline kpis computed"
    );

    let message = format!(
        "{} open quotes worth {} ({} weighted)",
        kpis.count,
        kpis.total_value.round_dp(2),
        kpis.weighted_value.round_dp(2)
    );
    CommandResult::with_data(
        "kpis",
        message,
        KpiReport {
            now,
            expiring_soon_days: aggregator.settings().expiring_soon_days,
            breakdown: status_breakdown(&quotes),
            kpis,
        },
    )
}
