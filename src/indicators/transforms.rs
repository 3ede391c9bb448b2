//! Window transforms shared by the calculated indicators.
//!
//! All windows are counted in observations, not calendar days. Results keep
//! the input's dates; warm-up rows are NaN.

use crate::core::timeseries::TimeSeries;

/// Window-period log-return spread between two price series:
/// `(ln A - ln A[t-window]) - (ln B - ln B[t-window])`.
///
/// Each leg is shifted within its own series before the date join, so a
/// date missing from one input does not shift the other.
pub fn rel_log_return(price_a: &TimeSeries, price_b: &TimeSeries, window: usize) -> TimeSeries {
    let leg = |prices: &TimeSeries| {
        let ln = prices.map(f64::ln);
        ln.zip_with(&ln.shift(window), |now, then| now - then)
    };
    leg(price_a).zip_with(&leg(price_b), |a, b| a - b)
}

/// Rolling standard deviation of a return series scaled by `sqrt(annualize)`.
pub fn realized_vol(returns: &TimeSeries, window: usize, annualize: f64) -> TimeSeries {
    let scale = annualize.sqrt();
    returns.rolling_std(window).map(|sd| sd * scale)
}

/// `series - rolling_median(series, window)`
pub fn rolling_median_deviation(series: &TimeSeries, window: usize) -> TimeSeries {
    series.zip_with(&series.rolling_median(window), |value, med| value - med)
}

/// `series - series[t-window]`
pub fn momentum(series: &TimeSeries, window: usize) -> TimeSeries {
    series.zip_with(&series.shift(window), |now, then| now - then)
}
