use chrono::NaiveDate;

use super::aggregate::ScoredModule;
use super::scorer::round_to;
use crate::core::timeseries::TimeSeries;
use crate::models::Attribution;

/// Observations back to the "7 days ago" score.
const LOOKBACK: usize = 7;
/// A factor history needs this many observations to contribute.
const MIN_HISTORY: usize = LOOKBACK + 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiftDrag {
    pub lift: Vec<Attribution>,
    pub drag: Vec<Attribution>,
}

/// The two dates the index's weekly change spans: the latest and the one
/// `LOOKBACK` observations before it.
fn change_window(index_history: &TimeSeries) -> Option<(NaiveDate, NaiveDate)> {
    let points = index_history.points();
    let end = points.last()?.date;
    let start = points.len().checked_sub(LOOKBACK + 1).map(|idx| points[idx].date)?;
    Some((start, end))
}

/// Splits the overall index's weekly change into per-factor contributions.
///
/// Each scored factor contributes its score change between the two dates
/// spanned by `index_history`, times the product of its weight in the module
/// and the module's weight in the index. Factor histories are read forward
/// filled, the same way they enter the index history, so the contributions
/// add up to the index change. Entries are sorted descending; ties keep
/// catalog order.
pub fn attribute(modules: &[ScoredModule], module_weights: &[f64], index_history: &TimeSeries) -> LiftDrag {
    let Some((start, end)) = change_window(index_history) else {
        return LiftDrag::default();
    };

    let mut contributions: Vec<Attribution> = modules
        .iter()
        .zip(module_weights)
        .flat_map(|(module, module_weight)| {
            module.factor_weights.iter().filter_map(move |(id, factor_weight)| {
                let factor = module.factors.iter().find(|f| f.id() == id)?;
                let history = &factor.history;
                let change = if history.len() >= MIN_HISTORY {
                    match (history.value_at(start), history.value_at(end)) {
                        (Some(then), Some(now)) => now - then,
                        _ => 0.0,
                    }
                } else {
                    0.0
                };
                Some(Attribution {
                    id: id.clone(),
                    name: factor.spec.name.clone(),
                    pts: round_to(change * factor_weight * module_weight, 2),
                })
            })
        })
        .collect();

    contributions.sort_by(|a, b| b.pts.total_cmp(&a.pts));

    let (lift, rest): (Vec<_>, Vec<_>) = contributions.into_iter().partition(|a| a.pts > 0.0);
    LiftDrag {
        lift,
        drag: rest.into_iter().filter(|a| a.pts < 0.0).collect(),
    }
}

impl LiftDrag {
    pub fn total(&self) -> f64 {
        self.lift.iter().chain(&self.drag).map(|a| a.pts).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::{combine_histories, HistorySummary, ModuleAggregator};
    use crate::analysis::format::ValueFormat;
    use crate::analysis::scorer::ScoredFactor;
    use crate::core::config::ScoringConfig;
    use crate::core::timeseries::TimeSeries;
    use crate::indicators::registry::{FactorSpec, ModuleSpec};
    use crate::models::FactorReport;
    use chrono::{Datelike, Duration, NaiveDate};

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn factor_spec(id: &str) -> FactorSpec {
        FactorSpec {
            id: id.to_string(),
            name: format!("Factor {}", id),
            series: id.to_string(),
            format: ValueFormat::Decimal(2),
            change_bps: false,
            is_extra: false,
        }
    }

    /// Factor whose score history moves linearly from `start` by `step` per day.
    fn factor(id: &str, len: usize, start: f64, step: f64) -> ScoredFactor {
        factor_with_history(
            id,
            TimeSeries::from_pairs(
                (0..len).map(|i| (as_of() - Duration::days((len - 1 - i) as i64), start + step * i as f64)),
            ),
        )
    }

    fn factor_with_history(id: &str, history: TimeSeries) -> ScoredFactor {
        let score = history.last().map(|dp| dp.value).unwrap_or(50.0);
        ScoredFactor {
            spec: factor_spec(id),
            report: FactorReport {
                id: id.to_string(),
                name: format!("Factor {}", id),
                value: String::new(),
                raw_value: 0.0,
                seven_day_change: String::new(),
                change_direction: crate::analysis::classify::ChangeDirection::Flat,
                historical_percentile_5y: score,
                score,
                status: crate::analysis::classify::Status::from_score(score),
                velocity: crate::analysis::classify::Velocity::Flat,
                trend_data: Vec::new(),
                percentile_data: Vec::new(),
                is_extra: false,
            },
            history,
        }
    }

    fn module(slug: &str, factors: Vec<ScoredFactor>) -> ScoredModule {
        let config = ScoringConfig::default();
        let spec = ModuleSpec {
            slug: slug.to_string(),
            name: slug.to_string(),
            factors: factors.iter().map(|f| f.spec.clone()).collect(),
        };
        ModuleAggregator::new(&config).aggregate(&spec, factors, as_of()).unwrap()
    }

    fn index_history(modules: &[&ScoredModule], weights: &[f64]) -> TimeSeries {
        let histories: Vec<&TimeSeries> = modules.iter().map(|m| &m.history).collect();
        combine_histories(&histories, weights)
    }

    #[test]
    fn test_lift_and_drag_are_split_and_sorted() {
        let m = module(
            "m",
            vec![
                factor("up", 20, 40.0, 1.0),
                factor("down", 20, 60.0, -0.5),
                factor("still", 20, 50.0, 0.0),
                factor("up-fast", 20, 10.0, 2.0),
            ],
        );
        let result = attribute(&[m.clone()], &[1.0], &m.history);

        // 4 equal factor weights of 0.25
        let lift: Vec<(&str, f64)> = result.lift.iter().map(|a| (a.id.as_str(), a.pts)).collect();
        assert_eq!(lift, vec![("up-fast", 3.5), ("up", 1.75)]);
        assert_eq!(result.drag.len(), 1);
        assert_eq!(result.drag[0].id, "down");
        assert_eq!(result.drag[0].pts, -0.88);
        assert_eq!(result.drag[0].name, "Factor down");
    }

    #[test]
    fn test_short_history_contributes_nothing() {
        let m = module("m", vec![factor("short", 8, 10.0, 5.0)]);
        assert_eq!(attribute(&[m.clone()], &[1.0], &m.history), LiftDrag::default());
        assert_eq!(attribute(&[m], &[1.0], &TimeSeries::default()), LiftDrag::default());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let a = module("a", vec![factor("first", 10, 10.0, 1.0)]);
        let b = module("b", vec![factor("second", 10, 10.0, 1.0)]);
        let overall = index_history(&[&a, &b], &[0.5, 0.5]);
        let result = attribute(&[a, b], &[0.5, 0.5], &overall);
        let ids: Vec<&str> = result.lift.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_contributions_sum_to_index_change() {
        let a = module("a", vec![factor("a1", 30, 20.0, 1.0), factor("a2", 30, 80.0, -0.3)]);
        let b = module("b", vec![factor("b1", 30, 50.0, 0.7)]);
        let weights = [0.6, 0.4];

        let overall = index_history(&[&a, &b], &weights);
        let change = HistorySummary::history_change(&overall).unwrap();

        let result = attribute(&[a, b], &weights, &overall);
        assert!((result.total() - change).abs() < 0.1);
    }

    #[test]
    fn test_mixed_calendars_sum_to_index_change() {
        // as_of is a Monday; one factor scores every calendar day, the other
        // only on weekdays
        let days: Vec<NaiveDate> = (0..60).map(|i| as_of() - Duration::days(59 - i)).collect();
        let calendar = TimeSeries::from_pairs(
            days.iter().enumerate().map(|(i, d)| (*d, 30.0 + ((i * 7) % 11) as f64 * 3.0)),
        );
        let weekdays = TimeSeries::from_pairs(
            days.iter()
                .enumerate()
                .filter(|(_, d)| d.weekday().number_from_monday() <= 5)
                .map(|(i, d)| (*d, 70.0 - ((i * 5) % 13) as f64 * 2.0)),
        );

        let cal = module("cal", vec![factor_with_history("cal", calendar)]);
        let wk = module("wk", vec![factor_with_history("wk", weekdays)]);
        let weights = [0.5, 0.5];

        let overall = index_history(&[&cal, &wk], &weights);
        let change = HistorySummary::history_change(&overall).unwrap();

        let result = attribute(&[cal, wk], &weights, &overall);
        assert!(
            (result.total() - change).abs() < 0.1,
            "index change {} attributed {}",
            change,
            result.total()
        );
    }
}
