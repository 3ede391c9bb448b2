use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::config::{AppConfig, ScoringConfig};
use super::rate_limiter::RateLimiter;
use super::snapshot::RawSnapshot;
use crate::fetcher::fred::FredFetcher;
use crate::fetcher::yahoo::YahooFetcher;
use crate::fetcher::DataSource;
use crate::indicators::registry::{RawInput, Registry, SourceType};
use crate::models::DataPoint;

/// Fetches one raw input. Provider failures are logged and yield an empty
/// series so the factors built on it drop out instead of failing the run.
async fn fetch_or_empty(source: &dyn DataSource, input: &RawInput) -> Vec<DataPoint> {
    match source.fetch_data(&input.key).await {
        Ok(points) => {
            info!("  > {} {}: {} observations", source.name(), input.key, points.len());
            points
        }
        Err(e) => {
            warn!("{} {} failed: {}", source.name(), input.key, e);
            Vec::new()
        }
    }
}

/// Fetches every registry raw input covering `fetch_days` before `as_of`.
pub async fn fetch_all(app: &AppConfig, config: &ScoringConfig, as_of: NaiveDate) -> RawSnapshot {
    let start = as_of - Duration::days(config.fetch_days);
    info!("Orchestrator: fetching {} raw inputs from {} to {}", Registry::get_raw_inputs().len(), start, as_of);

    let fred = FredFetcher::new(app.fred_api_key.clone(), start);
    let yahoo = YahooFetcher::new(start, as_of);

    let mut series = BTreeMap::new();
    for input in Registry::get_raw_inputs() {
        let source: &dyn DataSource = match input.source {
            SourceType::Fred => &fred,
            SourceType::Yahoo => &yahoo,
        };
        let points = fetch_or_empty(source, input).await;
        series.insert(input.key.clone(), points);
        RateLimiter::wait(input.source).await;
    }

    let failed = series.values().filter(|p| p.is_empty()).count();
    if failed > 0 {
        warn!("Orchestrator: {} of {} raw inputs unavailable", failed, series.len());
    }

    RawSnapshot::new(as_of, series)
}
