use crate::models::DataPoint;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Date-ordered series of daily observations.
///
/// Construction through [`TimeSeries::from_raw`] sorts, de-duplicates (last
/// observation per date wins) and drops non-finite values. Intermediate
/// results of the derivation layer may carry NaN (e.g. the warm-up of a
/// rolling window); call [`TimeSeries::dropna`] before scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    points: Vec<DataPoint>,
}

impl TimeSeries {
    pub fn from_raw(mut points: Vec<DataPoint>) -> Self {
        points.retain(|dp| dp.value.is_finite());
        // Stable sort keeps provider order within a date, so the dedup below
        // retains the last reported value.
        points.sort_by_key(|dp| dp.date);
        let mut cleaned: Vec<DataPoint> = Vec::with_capacity(points.len());
        for dp in points {
            match cleaned.last_mut() {
                Some(last) if last.date == dp.date => *last = dp,
                _ => cleaned.push(dp),
            }
        }
        Self { points: cleaned }
    }

    /// Wraps points that are already sorted by strictly increasing date.
    fn from_sorted(points: Vec<DataPoint>) -> Self {
        debug_assert!(points.windows(2).all(|w| w[0].date < w[1].date));
        Self { points }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        Self::from_raw(pairs.into_iter().map(|(d, v)| DataPoint::new(d, v)).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|dp| dp.value).collect()
    }

    pub fn first(&self) -> Option<&DataPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&DataPoint> {
        self.points.last()
    }

    /// Value `n` observations before the last one (`n = 0` is the last).
    pub fn nth_back(&self, n: usize) -> Option<f64> {
        let len = self.points.len();
        if n >= len {
            return None;
        }
        Some(self.points[len - 1 - n].value)
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |dp| dp.date)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    /// Last value observed on or before `date`.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|dp| dp.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].value)
    }

    pub fn dropna(&self) -> Self {
        Self::from_sorted(
            self.points
                .iter()
                .filter(|dp| dp.value.is_finite())
                .copied()
                .collect(),
        )
    }

    /// Observations on or after `cutoff`.
    pub fn since(&self, cutoff: NaiveDate) -> Self {
        let start = self.points.partition_point(|dp| dp.date < cutoff);
        Self::from_sorted(self.points[start..].to_vec())
    }

    /// Observations on or before `end`.
    pub fn until(&self, end: NaiveDate) -> Self {
        let stop = self.points.partition_point(|dp| dp.date <= end);
        Self::from_sorted(self.points[..stop].to_vec())
    }

    pub fn tail(&self, n: usize) -> Self {
        let start = self.points.len().saturating_sub(n);
        Self::from_sorted(self.points[start..].to_vec())
    }

    /// Index of the observation closest in calendar time to `target`.
    /// Ties resolve to the later observation.
    pub fn nearest_index(&self, target: NaiveDate) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        let idx = self.points.partition_point(|dp| dp.date < target);
        if idx == 0 {
            return Some(0);
        }
        if idx == self.points.len() {
            return Some(idx - 1);
        }
        let before = (target - self.points[idx - 1].date).num_days();
        let after = (self.points[idx].date - target).num_days();
        Some(if before < after { idx - 1 } else { idx })
    }

    /// Calendar-daily series from the first to the last observation, carrying
    /// the last known value through gaps.
    pub fn resample_daily_ffill(&self) -> Self {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Self::default();
        };
        let mut out = Vec::with_capacity((last.date - first.date).num_days() as usize + 1);
        let mut iter = self.points.iter().peekable();
        let mut current = first.value;
        let mut day = first.date;
        while day <= last.date {
            while let Some(dp) = iter.peek() {
                if dp.date <= day {
                    current = dp.value;
                    iter.next();
                } else {
                    break;
                }
            }
            out.push(DataPoint::new(day, current));
            day += Duration::days(1);
        }
        Self::from_sorted(out)
    }

    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self::from_sorted(
            self.points
                .iter()
                .map(|dp| DataPoint::new(dp.date, f(dp.value)))
                .collect(),
        )
    }

    /// Positional shift: each observation takes the value `periods` rows
    /// earlier; the first `periods` rows become NaN.
    pub fn shift(&self, periods: usize) -> Self {
        Self::from_sorted(
            self.points
                .iter()
                .enumerate()
                .map(|(i, dp)| {
                    let value = if i >= periods {
                        self.points[i - periods].value
                    } else {
                        f64::NAN
                    };
                    DataPoint::new(dp.date, value)
                })
                .collect(),
        )
    }

    /// `x[t] - x[t-1]`
    pub fn diff(&self) -> Self {
        self.zip_with(&self.shift(1), |a, b| a - b)
    }

    /// `x[t] / x[t-1] - 1`
    pub fn pct_change(&self) -> Self {
        self.zip_with(&self.shift(1), |a, b| a / b - 1.0)
    }

    /// Applies `f` to each full trailing window of `window` observations.
    /// Rows before the window fills, or whose window contains NaN, are NaN.
    pub fn rolling<F>(&self, window: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> f64,
    {
        let values = self.values();
        Self::from_sorted(
            self.points
                .iter()
                .enumerate()
                .map(|(i, dp)| {
                    let value = if window > 0 && i + 1 >= window {
                        let slice = &values[i + 1 - window..=i];
                        if slice.iter().all(|v| v.is_finite()) {
                            f(slice)
                        } else {
                            f64::NAN
                        }
                    } else {
                        f64::NAN
                    };
                    DataPoint::new(dp.date, value)
                })
                .collect(),
        )
    }

    /// Rolling sample standard deviation (n - 1 denominator).
    pub fn rolling_std(&self, window: usize) -> Self {
        self.rolling(window, sample_std)
    }

    pub fn rolling_median(&self, window: usize) -> Self {
        self.rolling(window, median)
    }

    /// Elementwise combination, inner-joined on date.
    pub fn zip_with<F>(&self, other: &TimeSeries, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64,
    {
        Self::from_sorted(
            align_series(self, other)
                .into_iter()
                .map(|(date, a, b)| DataPoint::new(date, f(a, b)))
                .collect(),
        )
    }
}

/// Inner join of two series on date.
/// Returns a vector of tuples (date, value_a, value_b).
pub fn align_series(series_a: &TimeSeries, series_b: &TimeSeries) -> Vec<(NaiveDate, f64, f64)> {
    let mut result = Vec::with_capacity(series_a.len().min(series_b.len()));
    let mut b_iter = series_b.points.iter().peekable();

    for a in &series_a.points {
        while let Some(b) = b_iter.peek() {
            if b.date < a.date {
                b_iter.next();
            } else {
                break;
            }
        }
        if let Some(b) = b_iter.peek() {
            if b.date == a.date {
                result.push((a.date, a.value, b.value));
            }
        }
    }

    result
}

/// Row of a multi-series alignment.
pub struct MultiAlignedData {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

/// Inner join of several series: only dates present in every input survive.
pub fn align_series_multi(series_list: &[&TimeSeries]) -> Vec<MultiAlignedData> {
    if series_list.is_empty() {
        return Vec::new();
    }

    let maps: Vec<BTreeMap<NaiveDate, f64>> = series_list
        .iter()
        .map(|s| s.points.iter().map(|dp| (dp.date, dp.value)).collect())
        .collect();

    maps[0]
        .keys()
        .filter_map(|date| {
            let values: Option<Vec<f64>> = maps.iter().map(|m| m.get(date).copied()).collect();
            values.map(|values| MultiAlignedData { date: *date, values })
        })
        .collect()
}

/// Outer join of several series with forward fill: every date present in
/// any input. Each series carries its last observation forward and reads
/// `None` only before its first observation.
pub fn align_series_union(series_list: &[&TimeSeries]) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
    let all_dates: BTreeSet<NaiveDate> = series_list
        .iter()
        .flat_map(|s| s.points.iter().map(|dp| dp.date))
        .collect();

    let mut cursors = vec![0usize; series_list.len()];
    all_dates
        .into_iter()
        .map(|date| {
            let values = series_list
                .iter()
                .zip(cursors.iter_mut())
                .map(|(s, cursor)| {
                    while *cursor < s.points.len() && s.points[*cursor].date <= date {
                        *cursor += 1;
                    }
                    cursor.checked_sub(1).map(|idx| s.points[idx].value)
                })
                .collect();
            (date, values)
        })
        .collect()
}

/// Elementwise combination of several series, inner-joined on date.
pub fn combine<F>(series_list: &[&TimeSeries], f: F) -> TimeSeries
where
    F: Fn(&[f64]) -> f64,
{
    TimeSeries::from_sorted(
        align_series_multi(series_list)
            .into_iter()
            .map(|row| DataPoint::new(row.date, f(&row.values)))
            .collect(),
    )
}

pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
