pub mod aggregate;
pub mod attribution;
pub mod classify;
pub mod format;
pub mod percentile;
pub mod scorer;

pub use aggregate::{IndexAggregator, IndexScore, ModuleAggregator, ScoredModule};
pub use attribution::{attribute, LiftDrag};
pub use percentile::{percentile_rank, PercentileKind, PercentileWindow};
pub use scorer::{FactorScorer, ScoredFactor};
