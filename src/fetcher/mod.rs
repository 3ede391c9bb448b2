use async_trait::async_trait;
use anyhow::Result;
use crate::models::DataPoint;

pub mod fred;
pub mod yahoo;

/// A provider of raw observations, keyed by the provider's own symbol.
///
/// Values are returned exactly as published; unit scaling and frequency
/// handling happen in the series store.
#[async_trait]
pub trait DataSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch_data(&self, series_id: &str) -> Result<Vec<DataPoint>>;
}
