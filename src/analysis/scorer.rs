use chrono::{Duration, NaiveDate};
use tracing::debug;

use super::classify::{Status, Velocity};
use super::format::{format_change, format_value};
use super::percentile::PercentileWindow;
use crate::core::config::ScoringConfig;
use crate::core::timeseries::TimeSeries;
use crate::indicators::registry::FactorSpec;
use crate::models::{FactorReport, TrendPoint};

/// Calendar offset of the "7-day" raw value comparison.
const CHANGE_DAYS: i64 = 7;

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Score in [0, 100] from a raw percentile, flipped for inverted factors.
pub fn score_from_percentile(percentile: f64, invert: bool) -> f64 {
    let score = if invert { 100.0 - percentile } else { percentile };
    round_to(score.clamp(0.0, 100.0), 1)
}

/// Last `n` observations as chart points, values rounded to 4 decimals.
pub fn trend_points(series: &TimeSeries, n: usize) -> Vec<TrendPoint> {
    series
        .tail(n)
        .points()
        .iter()
        .map(|dp| TrendPoint {
            date: dp.date,
            value: round_to(dp.value, 4),
        })
        .collect()
}

/// A factor that passed the observation minimum.
#[derive(Debug, Clone)]
pub struct ScoredFactor {
    pub spec: FactorSpec,
    pub report: FactorReport,
    /// Score reconstructed for every day of the history window
    pub history: TimeSeries,
}

impl ScoredFactor {
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn score(&self) -> f64 {
        self.report.score
    }
}

pub struct FactorScorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> FactorScorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores `series` as of `as_of`. `None` when the clean series is shorter
    /// than the configured minimum.
    pub fn score(&self, spec: &FactorSpec, series: &TimeSeries, as_of: NaiveDate) -> Option<ScoredFactor> {
        let series = series.dropna();
        if series.len() < self.config.min_observations {
            debug!(
                "Factor '{}' skipped: {} observations (min {})",
                spec.id,
                series.len(),
                self.config.min_observations
            );
            return None;
        }
        let last = *series.last()?;
        let invert = self.config.is_inverted(&spec.id);

        let lookback = series.since(as_of - Duration::days(self.config.lookback_days));
        let window = PercentileWindow::new(&lookback.values(), self.config.percentile_kind);
        let percentile = match lookback.last() {
            Some(dp) => window.rank(dp.value),
            None => window.rank(f64::NAN),
        };
        let score = score_from_percentile(percentile, invert);

        let history = self.history(&series, as_of, invert);
        let velocity = Velocity::from_history(&history.values());

        let past_value = series
            .nearest_index(last.date - Duration::days(CHANGE_DAYS))
            .map(|idx| series.points()[idx].value)
            .unwrap_or(last.value);
        let (seven_day_change, change_direction) = format_change(last.value, past_value, spec.change_bps);

        let report = FactorReport {
            id: spec.id.clone(),
            name: spec.name.clone(),
            value: format_value(last.value, spec.format),
            raw_value: last.value,
            seven_day_change,
            change_direction,
            historical_percentile_5y: round_to(percentile, 1),
            score,
            status: Status::from_score(score),
            velocity,
            trend_data: trend_points(&series, self.config.trend_points),
            percentile_data: window.distribution(),
            is_extra: self.config.is_extra(&spec.id),
        };

        Some(ScoredFactor {
            spec: spec.clone(),
            report,
            history,
        })
    }

    /// Every value of the history window ranked against that same fixed
    /// window (not a point-in-time expanding window).
    fn history(&self, series: &TimeSeries, as_of: NaiveDate, invert: bool) -> TimeSeries {
        let hist = series.since(as_of - Duration::days(self.config.history_days));
        if hist.len() < self.config.min_history {
            return TimeSeries::default();
        }
        let values = hist.values();
        let window = PercentileWindow::new(&values, self.config.percentile_kind);
        TimeSeries::from_pairs(
            hist.points()
                .iter()
                .zip(window.ranks(&values))
                .map(|(dp, pct)| (dp.date, score_from_percentile(pct, invert))),
        )
    }
}
