use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::analysis::percentile::PercentileKind;
use crate::error::{Result, ScoringError};
use crate::indicators::registry::{ModuleSpec, Registry};

const DEFAULT_MODULE_WEIGHTS: [(&str, f64); 7] = [
    ("liquidity", 0.20),
    ("funding", 0.18),
    ("treasury", 0.15),
    ("rates", 0.15),
    ("credit", 0.15),
    ("risk", 0.12),
    ("external", 0.05),
];

/// Factors where a higher raw value means tighter conditions.
const DEFAULT_INVERTED: [&str; 18] = [
    "tga-deviation",
    "on-rrp-buffer-risk",
    "collateral-repo-friction",
    "corridor-friction-1",
    "corridor-friction-2",
    "effr-iorb-spread",
    "cp-tbill-spread",
    "funding-fragmentation",
    "10y-rate-volatility",
    "real-rate-level",
    "nfci",
    "vix",
    "vix-term-structure",
    "fx-realized-volatility",
    "oil-volatility-deviation",
    "natural-gas",
    "dxy",
    "10y-breakeven",
];

/// Immutable scoring configuration. Everything the pipeline needs besides
/// the raw series and the as-of date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Module slug -> weight within the overall index
    pub module_weights: BTreeMap<String, f64>,
    /// Module slug -> (factor id -> weight within the module)
    pub factor_weights: BTreeMap<String, BTreeMap<String, f64>>,
    pub inverted: BTreeSet<String>,
    /// Display-only factors, excluded from aggregation
    pub extra: BTreeSet<String>,
    pub percentile_kind: PercentileKind,
    /// Comparison window for the current percentile
    pub lookback_days: i64,
    /// Window over which historical scores are reconstructed
    pub history_days: i64,
    /// How far back the acquisition layer fetches
    pub fetch_days: i64,
    pub trend_points: usize,
    pub min_observations: usize,
    /// Shortest history window that still produces a score history
    pub min_history: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            module_weights: DEFAULT_MODULE_WEIGHTS
                .iter()
                .map(|(slug, w)| (slug.to_string(), *w))
                .collect(),
            factor_weights: BTreeMap::new(),
            inverted: DEFAULT_INVERTED.iter().map(|id| id.to_string()).collect(),
            extra: Registry::get_modules()
                .iter()
                .flat_map(|m| m.factors.iter())
                .filter(|f| f.is_extra)
                .map(|f| f.id.clone())
                .collect(),
            percentile_kind: PercentileKind::Mean,
            lookback_days: 5 * 365,
            history_days: 5 * 365 + 90,
            fetch_days: 5 * 365 + 200,
            trend_points: 90,
            min_observations: 10,
            min_history: 5,
        }
    }
}

impl ScoringConfig {
    /// Loads a JSON config; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ScoringConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (slug, w) in &self.module_weights {
            check_weight(slug, *w)?;
        }
        for (slug, table) in &self.factor_weights {
            for (id, w) in table {
                check_weight(&format!("{}/{}", slug, id), *w)?;
            }
        }
        if self.lookback_days <= 0 || self.history_days <= 0 {
            return Err(ScoringError::Config(
                "lookback and history windows must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Weight tables may only name modules the catalog knows about.
    pub fn check_catalog(&self, catalog: &[ModuleSpec]) -> Result<()> {
        let known: BTreeSet<&str> = catalog.iter().map(|m| m.slug.as_str()).collect();
        let unknown = self
            .module_weights
            .keys()
            .chain(self.factor_weights.keys())
            .find(|slug| !known.contains(slug.as_str()));
        match unknown {
            Some(slug) => Err(ScoringError::Config(format!("unknown module '{}' in weight table", slug))),
            None => Ok(()),
        }
    }

    pub fn is_inverted(&self, factor_id: &str) -> bool {
        self.inverted.contains(factor_id)
    }

    pub fn is_extra(&self, factor_id: &str) -> bool {
        self.extra.contains(factor_id)
    }

    pub fn factor_weights_for(&self, slug: &str) -> Option<&BTreeMap<String, f64>> {
        self.factor_weights.get(slug)
    }
}

fn check_weight(key: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScoringError::InvalidWeight {
            key: key.to_string(),
            value,
        });
    }
    Ok(())
}

/// Process settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fred_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let fred_api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| anyhow::anyhow!("FRED_API_KEY is not set (environment or .env)"))?;
        if fred_api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("FRED_API_KEY is empty"));
        }
        Ok(Self { fred_api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_catalog() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.check_catalog(Registry::get_modules()).is_ok());

        let total: f64 = config.module_weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert_eq!(config.extra.len(), 16);
        assert!(config.is_inverted("vix"));
        assert!(!config.is_inverted("hy-credit"));
        assert!(config.is_extra("sofr"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ScoringConfig =
            serde_json::from_str(r#"{ "module_weights": { "liquidity": 1.0 }, "percentile_kind": "rank" }"#)
                .unwrap();
        assert_eq!(config.module_weights.len(), 1);
        assert_eq!(config.percentile_kind, PercentileKind::Rank);
        assert_eq!(config.lookback_days, 5 * 365);
        assert_eq!(config.inverted.len(), 18);
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let mut config = ScoringConfig::default();
        config
            .factor_weights
            .entry("risk".to_string())
            .or_default()
            .insert("vix".to_string(), -0.5);

        match config.validate() {
            Err(ScoringError::InvalidWeight { key, value }) => {
                assert_eq!(key, "risk/vix");
                assert_eq!(value, -0.5);
            }
            other => panic!("expected InvalidWeight, got {:?}", other),
        }

        let mut config = ScoringConfig::default();
        config.module_weights.insert("risk".to_string(), f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_module_is_rejected() {
        let mut config = ScoringConfig::default();
        config.module_weights.insert("crypto".to_string(), 0.1);
        assert!(matches!(
            config.check_catalog(Registry::get_modules()),
            Err(ScoringError::Config(_))
        ));
    }
}
