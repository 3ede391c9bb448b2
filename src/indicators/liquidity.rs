use super::CalculatedIndicator;
use crate::core::timeseries::{combine, TimeSeries};

/// ON RRP buffer risk: `sqrt(max(1 - rrp_billions / 100, 0))`.
///
/// Zero while the facility holds $100B or more, rising non-linearly as the
/// buffer drains toward empty.
pub struct RrpBufferRisk;

impl CalculatedIndicator for RrpBufferRisk {
    fn slug(&self) -> &str {
        "on-rrp-buffer-risk"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["RRPONTSYD"] // ON RRP balance, $B
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        let [rrp] = inputs else {
            return TimeSeries::default();
        };
        rrp.map(|billions| (1.0 - billions / 100.0).max(0.0).sqrt())
    }
}

/// Funding fragmentation: rolling standard deviation of the mean of the
/// three corridor spreads, in percent points.
pub struct FundingFragmentation {
    window: usize,
}

impl FundingFragmentation {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Default for FundingFragmentation {
    fn default() -> Self {
        Self::new(21)
    }
}

impl CalculatedIndicator for FundingFragmentation {
    fn slug(&self) -> &str {
        "funding-fragmentation"
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec!["collateral-repo-friction", "corridor-friction-1", "corridor-friction-2"]
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        if inputs.len() != 3 {
            return TimeSeries::default();
        }
        // Spreads arrive as decimals; x100 brings them to percent points.
        let triad_mean = combine(inputs, |spreads| {
            spreads.iter().map(|s| s * 100.0).sum::<f64>() / spreads.len() as f64
        });
        triad_mean.rolling_std(self.window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn daily(values: &[f64]) -> TimeSeries {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        TimeSeries::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (start + Duration::days(i as i64), *v)),
        )
    }

    #[test]
    fn test_rrp_buffer_risk_bounds() {
        let rrp = daily(&[2000.0, 100.0, 75.0, 0.0]);
        let risk = RrpBufferRisk.calculate(&[&rrp]);

        assert_eq!(risk.values()[0], 0.0);
        assert_eq!(risk.values()[1], 0.0);
        assert!((risk.values()[2] - 0.5).abs() < 1e-12);
        assert_eq!(risk.values()[3], 1.0);
    }

    #[test]
    fn test_funding_fragmentation_of_constant_spreads_is_zero() {
        let a = daily(&[0.0001; 5]);
        let b = daily(&[0.0002; 5]);
        let c = daily(&[0.0003; 5]);

        let frag = FundingFragmentation::new(3).calculate(&[&a, &b, &c]).dropna();
        assert_eq!(frag.len(), 3);
        assert!(frag.values().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_funding_fragmentation_uses_percent_points() {
        let a = daily(&[0.0, 0.03]);
        let b = daily(&[0.0, 0.0]);
        let c = daily(&[0.0, 0.0]);

        // triad means: 0.0, 1.0 (pp) -> sample std = sqrt(0.5)
        let frag = FundingFragmentation::new(2).calculate(&[&a, &b, &c]).dropna();
        assert!((frag.values()[0] - 0.5f64.sqrt()).abs() < 1e-12);
    }
}
