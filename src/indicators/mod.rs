use crate::core::timeseries::TimeSeries;

pub mod liquidity;
pub mod momentum;
pub mod registry;
pub mod spreads;
pub mod transforms;
pub mod volatility;

/// A factor series computed from other series.
///
/// Implementations are pure: missing or partial inputs propagate as NaN or
/// as an empty result, never as an error.
pub trait CalculatedIndicator: Send + Sync {
    /// Returns the unique series key (e.g. "fed-net-liquidity")
    fn slug(&self) -> &str;

    /// Keys of the series this indicator consumes, in the order `calculate`
    /// expects them. Keys may name raw inputs or other calculated series.
    fn required_inputs(&self) -> Vec<&str>;

    fn calculate(&self, inputs: &[&TimeSeries]) -> TimeSeries;
}
