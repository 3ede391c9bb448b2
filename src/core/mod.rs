pub mod config;
pub mod orchestrator;
pub mod pipeline;
pub mod rate_limiter;
pub mod snapshot;
pub mod store;
pub mod timeseries;
