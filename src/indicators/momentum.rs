use super::transforms::{momentum, rel_log_return, rolling_median_deviation};
use super::CalculatedIndicator;
use crate::core::timeseries::TimeSeries;

/// Change over `window` observations, e.g. 13-week net liquidity momentum.
pub struct Momentum {
    slug: &'static str,
    input: &'static str,
    window: usize,
    calendar_days: bool,
}

impl Momentum {
    pub fn new(slug: &'static str, input: &'static str, window: usize) -> Self {
        Self {
            slug,
            input,
            window,
            calendar_days: false,
        }
    }

    /// Measures `window` in calendar days: the input is forward filled to
    /// daily before shifting.
    pub fn on_calendar_days(mut self) -> Self {
        self.calendar_days = true;
        self
    }
}

impl CalculatedIndicator for Momentum {
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
        if self.calendar_days {
            momentum(&series.dropna().resample_daily_ffill(), self.window)
        } else {
            momentum(series, self.window)
        }
    }
}

/// Deviation from a rolling median, optionally floored at zero so that only
/// upside excursions register (oil volatility spikes).
pub struct MedianDeviation {
    slug: &'static str,
    input: &'static str,
    window: usize,
    floor_at_zero: bool,
}

impl MedianDeviation {
    pub fn new(slug: &'static str, input: &'static str, window: usize) -> Self {
        Self {
            slug,
            input,
            window,
            floor_at_zero: false,
        }
    }

    pub fn floored(mut self) -> Self {
        self.floor_at_zero = true;
        self
    }
}

impl CalculatedIndicator for MedianDeviation {
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
        let deviation = rolling_median_deviation(series, self.window);
        if self.floor_at_zero {
            deviation.map(|v| v.max(0.0))
        } else {
            deviation
        }
    }
}

/// Relative log return of one price series against another over `window`
/// observations (credit and risk-appetite pairs).
pub struct RelativeReturn {
    slug: &'static str,
    asset: &'static str,
    benchmark: &'static str,
    window: usize,
}

impl RelativeReturn {
    pub fn new(slug: &'static str, asset: &'static str, benchmark: &'static str) -> Self {
        Self {
            slug,
            asset,
            benchmark,
            window: 63,
        }
    }
}

impl CalculatedIndicator for RelativeReturn {
    fn slug(&self) -> &str {
        self.slug
    }

    fn required_inputs(&self) -> Vec<&str> {
        vec![self.asset, self.benchmark]
    }

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries {
        let [asset, benchmark] = inputs else {
            return TimeSeries::default();
        };
        rel_log_return(asset, benchmark, self.window)
    }
}
