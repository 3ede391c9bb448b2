//! Tie-aware percentile ranks against a fixed comparison window.
//!
//! The window is sorted once; every rank is then two binary searches, so
//! scoring a whole history against its own window is O(n log n).

use serde::{Deserialize, Serialize};

use crate::models::PercentileBucket;

/// Percentile returned when the window is too small to rank against.
pub const NEUTRAL_PERCENTILE: f64 = 50.0;

/// Tie handling of the rank formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PercentileKind {
    /// Mean of the strict and weak percentile: `(c_lt + c_le) / 2n · 100`.
    #[default]
    Mean,
    /// Average rank of the tied block: `(c_lt + c_le + [c_le > c_lt]) / 2n · 100`.
    Rank,
}

#[derive(Debug, Clone)]
pub struct PercentileWindow {
    sorted: Vec<f64>,
    kind: PercentileKind,
}

impl PercentileWindow {
    /// Non-finite values are ignored.
    pub fn new(values: &[f64], kind: PercentileKind) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted, kind }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Percentile rank of `x` in [0, 100]; 50 when the window has fewer than two values.
    pub fn rank(&self, x: f64) -> f64 {
        let n = self.sorted.len();
        if n < 2 || !x.is_finite() {
            return NEUTRAL_PERCENTILE;
        }
        let c_lt = self.sorted.partition_point(|v| *v < x);
        let c_le = self.sorted.partition_point(|v| *v <= x);
        let tied = match self.kind {
            PercentileKind::Mean => 0,
            PercentileKind::Rank => usize::from(c_le > c_lt),
        };
        let pct = (c_lt + c_le + tied) as f64 * 50.0 / n as f64;
        pct.clamp(0.0, 100.0)
    }

    pub fn ranks(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.rank(*v)).collect()
    }

    /// Linear-interpolated quantile for `q` in [0, 100]. NaN on an empty window.
    pub fn quantile(&self, q: f64) -> f64 {
        let n = self.sorted.len();
        if n == 0 {
            return f64::NAN;
        }
        let pos = (q.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        self.sorted[lo] + (self.sorted[hi] - self.sorted[lo]) * frac
    }

    /// Ten buckets bounded by the window's own 0th..100th percentiles. The
    /// last bucket's upper bound is the 99.9th percentile, exclusive.
    pub fn distribution(&self) -> Vec<PercentileBucket> {
        (0..10)
            .map(|i| {
                let lo_q = (i * 10) as f64;
                let hi_q = ((i + 1) * 10) as f64;
                let freq = if self.sorted.is_empty() {
                    0
                } else {
                    let lo = self.quantile(lo_q);
                    let hi = self.quantile(hi_q.min(99.9));
                    let start = self.sorted.partition_point(|v| *v < lo);
                    let end = self.sorted.partition_point(|v| *v < hi);
                    end.saturating_sub(start)
                };
                PercentileBucket {
                    range: format!("{}-{}", i * 10, (i + 1) * 10),
                    freq,
                }
            })
            .collect()
    }
}

/// One-off rank of `x` within `window` using the default tie handling.
pub fn percentile_rank(x: f64, window: &[f64]) -> f64 {
    PercentileWindow::new(window, PercentileKind::Mean).rank(x)
}
