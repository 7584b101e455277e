//! `trendpost trends`: run the product aggregation once.

use std::time::Duration;

use tracing::info;
use trendpost_config::AppConfig;
use trendpost_sources::SourceSet;
use trendpost_trends::{TrendAggregator, TrendPlan};

use super::CommandResult;

pub async fn run(config: AppConfig) -> CommandResult {
    let sources = SourceSet::from_config(&config.sources)?;
    let plan = TrendPlan::product(&sources, &config.sources);
    let aggregator = TrendAggregator::new(Duration::from_secs(config.sources.timeout_secs));

    info!(sources = plan.len(), "Collecting product trends");
    let report = aggregator.aggregate(&plan).await;
    info!(
        records = report.total_records(),
        failed = report.failed_sources(),
        "Trends collected"
    );

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
