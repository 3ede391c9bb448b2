//! Weighted roll-up of factor scores into modules, and of modules into the
//! overall index, for both the current score and the score history.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::classify::{Status, TrendDirection, INDEX_TREND_THRESHOLD, MODULE_TREND_THRESHOLD};
use super::percentile::{PercentileWindow, NEUTRAL_PERCENTILE};
use super::scorer::{round_to, trend_points, ScoredFactor};
use crate::core::config::ScoringConfig;
use crate::core::timeseries::{align_series_union, TimeSeries};
use crate::indicators::registry::ModuleSpec;
use crate::models::{ModuleReport, TrendPoint};

/// Observations between the latest score and the "previous" score.
const PREV_OFFSET: usize = 7;
/// Histories this short report a neutral percentile.
const MIN_PERCENTILE_HISTORY: usize = 10;
/// Days covered by the trend direction label
pub const TREND_DAYS: usize = 2;

/// Weights for `ids`, normalized to sum to 1.
///
/// Ids present in `configured` take their configured weight. Ids missing from
/// the table split the residual `1 - sum(configured)` equally, or get `1/n`
/// each when nothing is left over. An empty table, or a total of zero, falls
/// back to equal weights.
pub fn normalize_weights(ids: &[&str], configured: Option<&BTreeMap<String, f64>>) -> Vec<f64> {
    let n = ids.len();
    if n == 0 {
        return Vec::new();
    }
    let equal = vec![1.0 / n as f64; n];
    let Some(table) = configured.filter(|t| !t.is_empty()) else {
        return equal;
    };

    let known: Vec<Option<f64>> = ids.iter().map(|id| table.get(*id).copied()).collect();
    let configured_sum: f64 = known.iter().flatten().sum();
    let unconfigured = known.iter().filter(|w| w.is_none()).count();
    let residual = 1.0 - configured_sum;
    let share = if unconfigured > 0 && residual > 0.0 {
        residual / unconfigured as f64
    } else {
        1.0 / n as f64
    };

    let raw: Vec<f64> = known.iter().map(|w| w.unwrap_or(share)).collect();
    let total: f64 = raw.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return equal;
    }
    raw.iter().map(|w| w / total).collect()
}

/// Pointwise weighted mean over the union of dates, each history forward
/// filled onto that calendar. Before a history's first observation its
/// weight is left out and the others are renormalized.
pub fn combine_histories(histories: &[&TimeSeries], weights: &[f64]) -> TimeSeries {
    TimeSeries::from_pairs(align_series_union(histories).into_iter().filter_map(|(date, values)| {
        let (sum, weight) = values
            .iter()
            .zip(weights)
            .filter_map(|(v, w)| v.map(|v| (v * w, *w)))
            .fold((0.0, 0.0), |(s, t), (vw, w)| (s + vw, t + w));
        (weight > 0.0).then(|| (date, sum / weight))
    }))
}

/// Fields derived from a score and its history, shared by modules and the index.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub prev_score: f64,
    pub seven_day_change_pct: f64,
    pub trend_direction: TrendDirection,
    pub percentile_5y: f64,
    pub trend_data: Vec<TrendPoint>,
}

impl HistorySummary {
    pub fn new(
        score: f64,
        history: &TimeSeries,
        config: &ScoringConfig,
        as_of: NaiveDate,
        trend_threshold: f64,
    ) -> Self {
        let values = history.values();
        let prev_score = if values.len() > PREV_OFFSET {
            round_to(values[values.len() - 1 - PREV_OFFSET], 1)
        } else {
            score
        };
        let seven_day_change_pct = round_to((score - prev_score) / prev_score.max(0.01) * 100.0, 2);

        let percentile_5y = if values.len() > MIN_PERCENTILE_HISTORY {
            let recent = history.since(as_of - Duration::days(config.lookback_days));
            let window = PercentileWindow::new(&recent.values(), config.percentile_kind);
            let last = recent.last().map(|dp| dp.value).unwrap_or(f64::NAN);
            round_to(window.rank(last), 1)
        } else {
            NEUTRAL_PERCENTILE
        };

        Self {
            prev_score,
            seven_day_change_pct,
            trend_direction: TrendDirection::from_recent(&values, trend_threshold),
            percentile_5y,
            trend_data: trend_points(history, config.trend_points),
        }
    }

    /// Point change of the history over the previous-score offset.
    pub fn history_change(history: &TimeSeries) -> Option<f64> {
        Some(history.nth_back(0)? - history.nth_back(PREV_OFFSET)?)
    }
}

#[derive(Debug, Clone)]
pub struct ScoredModule {
    pub slug: String,
    pub name: String,
    pub score: f64,
    pub history: TimeSeries,
    pub summary: HistorySummary,
    /// Every factor that passed the observation minimum, extras included
    pub factors: Vec<ScoredFactor>,
    /// Normalized weights of the scored (non-extra) factors, by id
    pub factor_weights: Vec<(String, f64)>,
}

impl ScoredModule {
    pub fn report(&self, weight: f64, as_of: NaiveDate) -> ModuleReport {
        let status = Status::from_score(self.score);
        let (last_updated, updated_at) = update_stamps(as_of);
        ModuleReport {
            slug: self.slug.clone(),
            name: self.name.clone(),
            weight: round_to(weight, 4),
            score: self.score,
            prev_score: self.summary.prev_score,
            seven_day_change_pct: self.summary.seven_day_change_pct,
            trend_days: TREND_DAYS,
            trend_direction: self.summary.trend_direction,
            percentile_5y: self.summary.percentile_5y,
            status,
            color: status.color().to_string(),
            last_updated,
            updated_at,
            trend_data: self.summary.trend_data.clone(),
            factors: self.factors.iter().map(|f| f.report.clone()).collect(),
        }
    }
}

/// "Updated Jun 30, 2025" and an ISO timestamp, both pinned to the as-of date.
pub fn update_stamps(as_of: NaiveDate) -> (String, String) {
    (
        format!("Updated {}", as_of.format("%b %d, %Y")),
        format!("{}T00:00:00Z", as_of.format("%Y-%m-%d")),
    )
}

pub struct ModuleAggregator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> ModuleAggregator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    /// `None` when no scored factor survived; the module is then dropped.
    pub fn aggregate(&self, spec: &ModuleSpec, factors: Vec<ScoredFactor>, as_of: NaiveDate) -> Option<ScoredModule> {
        let scored: Vec<&ScoredFactor> = factors
            .iter()
            .filter(|f| !self.config.is_extra(f.id()))
            .collect();
        if scored.is_empty() {
            warn!("Module '{}' dropped: no scorable factors", spec.slug);
            return None;
        }

        let ids: Vec<&str> = scored.iter().map(|f| f.id()).collect();
        let weights = normalize_weights(&ids, self.config.factor_weights_for(&spec.slug));

        let score = round_to(
            scored.iter().zip(&weights).map(|(f, w)| f.score() * w).sum(),
            1,
        );
        let histories: Vec<&TimeSeries> = scored.iter().map(|f| &f.history).collect();
        let history = combine_histories(&histories, &weights);
        let summary = HistorySummary::new(score, &history, self.config, as_of, MODULE_TREND_THRESHOLD);

        info!(
            "Module '{}': score {:.1} from {} factors ({} display-only)",
            spec.slug,
            score,
            scored.len(),
            factors.len() - scored.len()
        );

        let factor_weights = ids.iter().map(|id| id.to_string()).zip(weights).collect();
        Some(ScoredModule {
            slug: spec.slug.clone(),
            name: spec.name.clone(),
            score,
            history,
            summary,
            factors,
            factor_weights,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IndexScore {
    pub score: f64,
    pub history: TimeSeries,
    pub summary: HistorySummary,
    /// Normalized module weights, aligned with the module slice passed in
    pub module_weights: Vec<f64>,
}

pub struct IndexAggregator<'a> {
    config: &'a ScoringConfig,
}

impl<'a> IndexAggregator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn aggregate(&self, modules: &[ScoredModule], as_of: NaiveDate) -> IndexScore {
        let slugs: Vec<&str> = modules.iter().map(|m| m.slug.as_str()).collect();
        let module_weights = normalize_weights(&slugs, Some(&self.config.module_weights));

        let score = round_to(
            modules.iter().zip(&module_weights).map(|(m, w)| m.score * w).sum(),
            1,
        );
        let histories: Vec<&TimeSeries> = modules.iter().map(|m| &m.history).collect();
        let history = combine_histories(&histories, &module_weights);
        let summary = HistorySummary::new(score, &history, self.config, as_of, INDEX_TREND_THRESHOLD);

        IndexScore {
            score,
            history,
            summary,
            module_weights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn assert_weights(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_weights_renormalize_to_one() {
        let t = table(&[("a", 0.8), ("b", 0.8), ("c", 0.4)]);
        assert_weights(&normalize_weights(&["a", "b", "c"], Some(&t)), &[0.4, 0.4, 0.2]);
    }

    #[test]
    fn test_missing_configured_factor_is_dropped() {
        let t = table(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);
        assert_weights(&normalize_weights(&["a", "c"], Some(&t)), &[0.5 / 0.7, 0.2 / 0.7]);
    }

    #[test]
    fn test_unconfigured_factor_takes_residual() {
        let t = table(&[("a", 0.5)]);
        assert_weights(&normalize_weights(&["a", "b", "c"], Some(&t)), &[0.5, 0.25, 0.25]);

        // nothing left over: unconfigured ids fall back to 1/n before normalizing
        let t = table(&[("a", 1.0)]);
        assert_weights(&normalize_weights(&["a", "b"], Some(&t)), &[1.0 / 1.5, 0.5 / 1.5]);
    }

    #[test]
    fn test_degenerate_tables_use_equal_weights() {
        assert_weights(&normalize_weights(&["a", "b"], None), &[0.5, 0.5]);
        assert_weights(&normalize_weights(&["a", "b"], Some(&BTreeMap::new())), &[0.5, 0.5]);
        let zeros = table(&[("a", 0.0), ("b", 0.0)]);
        assert_weights(&normalize_weights(&["a", "b"], Some(&zeros)), &[0.5, 0.5]);
        assert!(normalize_weights(&[], None).is_empty());
    }

    #[test]
    fn test_combine_histories_fills_forward() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        let a = TimeSeries::from_pairs([(d(1), 10.0), (d(2), 20.0)]);
        let b = TimeSeries::from_pairs([(d(2), 40.0), (d(3), 60.0)]);

        let combined = combine_histories(&[&a, &b], &[0.75, 0.25]);
        assert_eq!(combined.len(), 3);
        // b has not started yet
        assert_eq!(combined.get(d(1)), Some(10.0));
        assert_eq!(combined.get(d(2)), Some(25.0));
        // a carried forward from d(2)
        assert_eq!(combined.get(d(3)), Some(30.0));
    }

    #[test]
    fn test_weekend_points_keep_every_factor() {
        // Fri 2025-06-27 .. Mon 2025-06-30
        let d = |day| NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        let calendar = TimeSeries::from_pairs((27..=30).map(|day| (d(day), 40.0 + day as f64)));
        let weekdays = TimeSeries::from_pairs([(d(27), 80.0), (d(30), 90.0)]);

        let combined = combine_histories(&[&calendar, &weekdays], &[0.5, 0.5]);
        assert_eq!(combined.values(), vec![73.5, 74.0, 74.5, 80.0]);
    }

    #[test]
    fn test_history_summary() {
        let config = ScoringConfig::default();
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let history = TimeSeries::from_pairs(
            (0..12).map(|i| (as_of - Duration::days(11 - i), 40.0 + i as f64)),
        );

        let summary = HistorySummary::new(51.0, &history, &config, as_of, MODULE_TREND_THRESHOLD);
        assert_eq!(summary.prev_score, 44.0);
        assert_eq!(summary.seven_day_change_pct, round_to(7.0 / 44.0 * 100.0, 2));
        assert_eq!(summary.trend_direction, TrendDirection::Improving);
        assert_eq!(summary.percentile_5y, round_to(23.0 * 50.0 / 12.0, 1));
        assert_eq!(summary.trend_data.len(), 12);
        assert_eq!(HistorySummary::history_change(&history), Some(7.0));

        let short = history.tail(7);
        let summary = HistorySummary::new(51.0, &short, &config, as_of, MODULE_TREND_THRESHOLD);
        assert_eq!(summary.prev_score, 51.0);
        assert_eq!(summary.seven_day_change_pct, 0.0);
        assert_eq!(summary.percentile_5y, 50.0);
    }

    #[test]
    fn test_zero_previous_score_is_floored() {
        let config = ScoringConfig::default();
        let as_of = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let history = TimeSeries::from_pairs((0..8).map(|i| (as_of - Duration::days(7 - i), 0.0)));

        let summary = HistorySummary::new(1.0, &history, &config, as_of, MODULE_TREND_THRESHOLD);
        assert_eq!(summary.prev_score, 0.0);
        assert_eq!(summary.seven_day_change_pct, 10000.0);
    }

    #[test]
    fn test_update_stamps() {
        let (last, at) = update_stamps(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap());
        assert_eq!(last, "Updated Jun 03, 2025");
        assert_eq!(at, "2025-06-03T00:00:00Z");
    }
}
