use super::transforms::realized_vol;
use super::CalculatedIndicator;
use crate::core::timeseries::TimeSeries;

/// How daily returns are formed before the rolling deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Returns {
    /// `x[t] / x[t-1] - 1` (prices)
    Percent,
    /// `(x[t] - x[t-1]) · scale` (yields, already in decimal form)
    Difference { scale: f64 },
}

/// Rolling realized volatility of an input series.
pub struct RealizedVolatility {
    slug: &'static str,
    input: &'static str,
    returns: Returns,
    window: usize,
    annualize: f64,
}

impl RealizedVolatility {
    /// Annualized (252 trading days) volatility of percent returns.
    pub fn annualized(slug: &'static str, input: &'static str, window: usize) -> Self {
        Self {
            slug,
            input,
            returns: Returns::Percent,
            window,
            annualize: 252.0,
        }
    }

    /// Unannualized volatility of scaled daily differences.
    pub fn of_changes(slug: &'static str, input: &'static str, window: usize, scale: f64) -> Self {
        Self {
            slug,
            input,
            returns: Returns::Difference { scale },
            window,
            annualize: 1.0,
        }
    }
}

impl CalculatedIndicator for RealizedVolatility {
    fn slug(&self) -> &str {
        self.slug
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec![self.input]
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        let [series] = inputs else {
            return TimeSeries::default();
        };
        let returns = match self.returns {
            Returns::Percent => series.pct_change(),
            Returns::Difference { scale } => series.diff().map(|d| d * scale),
        };
        realized_vol(&returns, self.window, self.annualize)
    }
}
