use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::models::{Dashboard, DataPoint};

/// Raw provider observations as fetched, before scaling or resampling.
/// Replaying a snapshot reproduces a run without the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    pub fetched_on: NaiveDate,
    pub series: BTreeMap<String, Vec<DataPoint>>,
}

impl RawSnapshot {
    pub fn new(fetched_on: NaiveDate, series: BTreeMap<String, Vec<DataPoint>>) -> Self {
        Self { fetched_on, series }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), self)?;
        info!("Saved raw snapshot ({} series) to {}", self.series.len(), path.as_ref().display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: RawSnapshot = serde_json::from_str(&content)?;
        info!(
            "Loaded raw snapshot from {} ({} series, fetched {})",
            path.as_ref().display(),
            snapshot.series.len(),
            snapshot.fetched_on
        );
        Ok(snapshot)
    }
}

/// Pretty-printed dashboard JSON; parent directories are created as needed.
pub fn write_dashboard(dashboard: &Dashboard, path: impl AsRef<Path>) -> Result<()> {
    write_json(path.as_ref(), dashboard)?;
    info!("Dashboard written to {}", path.as_ref().display());
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_survives_disk() {
        let dir = std::env::temp_dir().join(format!("macro-conditions-snapshot-{}", std::process::id()));
        let path = dir.join("nested").join("raw.json");

        let mut series = BTreeMap::new();
        series.insert(
            "DGS10".to_string(),
            vec![DataPoint::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 3.95)],
        );
        series.insert("^VIX".to_string(), Vec::new());
        let snapshot = RawSnapshot::new(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(), series);

        snapshot.save(&path).unwrap();
        let loaded = RawSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_snapshot_is_io_error() {
        let err = RawSnapshot::load("/nonexistent/macro-conditions/raw.json").unwrap_err();
        assert!(matches!(err, crate::error::ScoringError::Io(_)));
    }
}
