use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::classify::{ChangeDirection, Status, TrendDirection, Velocity};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// One point of a bounded recent trend chart.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Histogram bucket over the trailing window, bounded by percentile cut points.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PercentileBucket {
    pub range: String,
    pub freq: usize,
}

/// Lift or drag entry: a factor's weighted point contribution to the 7-day
/// change of the overall index.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attribution {
    pub id: String,
    pub name: String,
    pub pts: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FactorReport {
    pub id: String,
    pub name: String,
    /// Display string, e.g. "$5821.33B" or "0.0150%".
    pub value: String,
    pub raw_value: f64,
    pub seven_day_change: String,
    pub change_direction: ChangeDirection,
    #[serde(rename = "historicalPercentile5Y")]
    pub historical_percentile_5y: f64,
    pub score: f64,
    pub status: Status,
    pub velocity: Velocity,
    pub trend_data: Vec<TrendPoint>,
    pub percentile_data: Vec<PercentileBucket>,
    pub is_extra: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleReport {
    pub slug: String,
    pub name: String,
    /// Weight within the overall index after renormalization over present modules.
    pub weight: f64,
    pub score: f64,
    pub prev_score: f64,
    pub seven_day_change_pct: f64,
    pub trend_days: usize,
    pub trend_direction: TrendDirection,
    #[serde(rename = "percentile5Y")]
    pub percentile_5y: f64,
    pub status: Status,
    pub color: String,
    pub last_updated: String,
    pub updated_at: String,
    pub trend_data: Vec<TrendPoint>,
    pub factors: Vec<FactorReport>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub as_of: NaiveDate,
    pub score: f64,
    pub prev_score: f64,
    pub seven_day_change_pct: f64,
    pub trend_days: usize,
    pub trend_direction: TrendDirection,
    #[serde(rename = "percentile5Y")]
    pub percentile_5y: f64,
    pub status: Status,
    pub last_updated: String,
    pub updated_at: String,
    pub trend_data: Vec<TrendPoint>,
    pub modules: Vec<ModuleReport>,
    pub score_lift: Vec<Attribution>,
    pub score_drag: Vec<Attribution>,
}

impl Dashboard {
    pub fn module(&self, slug: &str) -> Option<&ModuleReport> {
        self.modules.iter().find(|m| m.slug == slug)
    }

    pub fn factor(&self, id: &str) -> Option<&FactorReport> {
        self.modules
            .iter()
            .flat_map(|m| m.factors.iter())
            .find(|f| f.id == id)
    }
}
