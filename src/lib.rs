//! Macro conditions index.
//!
//! Raw FRED and Yahoo series are turned into percentile-scored factors,
//! rolled up into weighted modules and a single overall score, with
//! lift/drag attribution of the weekly change.

pub mod analysis;
pub mod core;
pub mod error;
pub mod fetcher;
pub mod indicators;
pub mod models;

pub use crate::core::config::{AppConfig, ScoringConfig};
pub use crate::core::pipeline::Pipeline;
pub use crate::core::snapshot::RawSnapshot;
pub use crate::core::store::SeriesStore;
pub use crate::error::{Result, ScoringError};
pub use crate::models::Dashboard;
