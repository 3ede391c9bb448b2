use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::timeseries::TimeSeries;
use crate::indicators::registry::{Frequency, Registry};
use crate::models::DataPoint;

/// Clean raw series for one run, keyed by provider symbol.
///
/// Keys known to the registry are scaled to model units and, for weekly
/// inputs, resampled to calendar days on insert. Unknown keys are cleaned
/// but otherwise stored as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesStore {
    series: BTreeMap<String, TimeSeries>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_raw(raw: &BTreeMap<String, Vec<DataPoint>>) -> Self {
        let mut store = Self::new();
        for (key, points) in raw {
            store.insert_raw(key, points.clone());
        }
        store
    }

    pub fn insert_raw(&mut self, key: &str, points: Vec<DataPoint>) {
        let mut series = TimeSeries::from_raw(points);
        if let Some(input) = Registry::get_raw_input(key) {
            if input.scale != 1.0 {
                let scale = input.scale;
                series = series.map(|v| v * scale);
            }
            if input.frequency == Frequency::Weekly {
                series = series.resample_daily_ffill();
            }
        }
        self.series.insert(key.to_string(), series);
    }

    /// Missing keys read as `None`; callers treat that like an empty series.
    pub fn get(&self, key: &str) -> Option<&TimeSeries> {
        self.series.get(key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Keys whose series has no observations.
    pub fn empty_keys(&self) -> Vec<&str> {
        self.series
            .iter()
            .filter(|(_, s)| s.is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Copy with every series cut at `as_of`, so nothing after "now" leaks
    /// into a run.
    pub fn until(&self, as_of: NaiveDate) -> Self {
        Self {
            series: self
                .series
                .iter()
                .map(|(k, s)| (k.clone(), s.until(as_of)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_datapoint(date: &str, value: f64) -> DataPoint {
        DataPoint::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), value)
    }

    #[test]
    fn test_rates_are_scaled_to_decimals() {
        let mut store = SeriesStore::new();
        store.insert_raw("DGS10", vec![create_datapoint("2024-01-02", 3.95)]);
        let v = store.get("DGS10").unwrap().values()[0];
        assert!((v - 0.0395).abs() < 1e-12);
    }

    #[test]
    fn test_weekly_balance_sheet_is_filled_daily() {
        let mut store = SeriesStore::new();
        store.insert_raw(
            "WALCL",
            vec![
                create_datapoint("2024-01-03", 7_700_000.0),
                create_datapoint("2024-01-10", 7_690_000.0),
            ],
        );
        let walcl = store.get("WALCL").unwrap();
        assert_eq!(walcl.len(), 8);
        let jan_9 = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert!((walcl.get(jan_9).unwrap() - 7700.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_keys_and_failures() {
        let mut raw = BTreeMap::new();
        raw.insert("custom".to_string(), vec![create_datapoint("2024-01-02", 5.0)]);
        raw.insert("^VIX".to_string(), Vec::new());

        let store = SeriesStore::from_raw(&raw);
        assert_eq!(store.get("custom").unwrap().values(), vec![5.0]);
        assert_eq!(store.empty_keys(), vec!["^VIX"]);
        assert!(store.get("SPY").is_none());
    }

    #[test]
    fn test_until_truncates_every_series() {
        let mut store = SeriesStore::new();
        store.insert_raw(
            "SPY",
            vec![
                create_datapoint("2024-01-02", 470.0),
                create_datapoint("2024-01-03", 468.0),
            ],
        );
        let cut = store.until(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(cut.get("SPY").unwrap().len(), 1);
        assert_eq!(store.get("SPY").unwrap().len(), 2);
    }
}
