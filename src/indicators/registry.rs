use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

use crate::analysis::format::ValueFormat;
use crate::indicators::liquidity::{FundingFragmentation, RrpBufferRisk};
use crate::indicators::momentum::{MedianDeviation, Momentum, RelativeReturn};
use crate::indicators::spreads::{LinearCombination, Ratio};
use crate::indicators::volatility::RealizedVolatility;
use crate::indicators::CalculatedIndicator;

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceType {
    Fred,
    Yahoo,
}

/// Native publication frequency of a raw input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Frequency {
    Daily,
    /// Resampled to calendar days with forward fill before use.
    Weekly,
}

// ============================================================================
// METADATA STRUCTS
// ============================================================================

/// A raw series delivered by the acquisition layer.
#[derive(Debug, Clone, Serialize)]
pub struct RawInput {
    /// Store key; equals the provider symbol.
    pub key: String,
    pub source: SourceType,
    pub frequency: Frequency,
    /// Multiplier applied on load (percent -> decimal, $M -> $B).
    pub scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactorSpec {
    pub id: String,
    pub name: String,
    /// Key of the series backing this factor: a raw input or a calculated series.
    pub series: String,
    pub format: ValueFormat,
    /// Render the 7-day change in basis points.
    pub change_bps: bool,
    /// Display-only by default; the scoring config may override.
    pub is_extra: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSpec {
    pub slug: String,
    pub name: String,
    pub factors: Vec<FactorSpec>,
}

macro_rules! raw {
    ($key:expr, $source:expr, $freq:expr, $scale:expr) => {
        RawInput {
            key: $key.to_string(),
            source: $source,
            frequency: $freq,
            scale: $scale,
        }
    };
}

macro_rules! factor {
    // Pattern with 6 arguments (explicit extra flag)
    ($id:expr, $name:expr, $series:expr, $fmt:expr, $bps:expr, $extra:expr) => {
        FactorSpec {
            id: $id.to_string(),
            name: $name.to_string(),
            series: $series.to_string(),
            format: $fmt,
            change_bps: $bps,
            is_extra: $extra,
        }
    };
    // Pattern with 5 arguments (scored factor)
    ($id:expr, $name:expr, $series:expr, $fmt:expr, $bps:expr) => {
        factor!($id, $name, $series, $fmt, $bps, false)
    };
}

const PCT_TO_DECIMAL: f64 = 0.01;
const MILLIONS_TO_BILLIONS: f64 = 0.001;

// ============================================================================
// STATIC RAW INPUT REGISTRY
// ============================================================================

static RAW_INPUTS: Lazy<Vec<RawInput>> = Lazy::new(|| {
    use Frequency::*;
    use SourceType::*;
    vec![
        // Balance sheet / liquidity
        raw!("WALCL", Fred, Weekly, MILLIONS_TO_BILLIONS),
        raw!("WDTGAL", Fred, Weekly, MILLIONS_TO_BILLIONS),
        raw!("RRPONTSYD", Fred, Daily, 1.0), // already $B
        raw!("WRESBAL", Fred, Weekly, MILLIONS_TO_BILLIONS),
        // Policy corridor & money market
        raw!("DFF", Fred, Daily, PCT_TO_DECIMAL),
        raw!("SOFR", Fred, Daily, PCT_TO_DECIMAL),
        raw!("IORB", Fred, Daily, PCT_TO_DECIMAL),
        raw!("OBFR", Fred, Daily, PCT_TO_DECIMAL),
        raw!("DCPF3M", Fred, Daily, PCT_TO_DECIMAL),
        // Treasury curve
        raw!("DGS10", Fred, Daily, PCT_TO_DECIMAL),
        raw!("DGS2", Fred, Daily, PCT_TO_DECIMAL),
        raw!("DGS30", Fred, Daily, PCT_TO_DECIMAL),
        raw!("DGS3MO", Fred, Daily, PCT_TO_DECIMAL),
        // Real rates & inflation
        raw!("DFII5", Fred, Daily, PCT_TO_DECIMAL),
        raw!("DFII10", Fred, Daily, PCT_TO_DECIMAL),
        raw!("T10YIE", Fred, Daily, PCT_TO_DECIMAL),
        // Conditions & commodities
        raw!("NFCI", Fred, Weekly, 1.0),
        raw!("DCOILWTICO", Fred, Daily, 1.0),
        raw!("DHHNGSP", Fred, Daily, 1.0),
        // Market prices
        raw!("^VIX", Yahoo, Daily, 1.0),
        raw!("^VIX3M", Yahoo, Daily, 1.0),
        raw!("^OVX", Yahoo, Daily, 1.0),
        raw!("DX-Y.NYB", Yahoo, Daily, 1.0),
        raw!("SPY", Yahoo, Daily, 1.0),
        raw!("TLT", Yahoo, Daily, 1.0),
        raw!("IWM", Yahoo, Daily, 1.0),
        raw!("HYG", Yahoo, Daily, 1.0),
        raw!("LQD", Yahoo, Daily, 1.0),
        raw!("KRE", Yahoo, Daily, 1.0),
        raw!("IEF", Yahoo, Daily, 1.0),
        raw!("IEI", Yahoo, Daily, 1.0),
    ]
});

static RAW_INPUT_MAP: Lazy<HashMap<String, usize>> = Lazy::new(|| {
    RAW_INPUTS
        .iter()
        .enumerate()
        .map(|(idx, raw)| (raw.key.clone(), idx))
        .collect()
});

// ============================================================================
// STATIC MODULE CATALOG
// ============================================================================

static MODULES: Lazy<Vec<ModuleSpec>> = Lazy::new(|| {
    use ValueFormat::*;
    vec![
        ModuleSpec {
            slug: "liquidity".to_string(),
            name: "Liquidity".to_string(),
            factors: vec![
                factor!("fed-net-liquidity", "Fed Net Liquidity", "fed-net-liquidity", UsdBillions, false),
                factor!("bank-reserves", "Bank Reserves", "WRESBAL", UsdBillions, false),
                factor!("net-liquidity-momentum", "Net Liquidity Momentum (13W)", "net-liquidity-momentum", UsdBillions, false),
                factor!("tga-deviation", "TGA Deviation", "tga-deviation", UsdBillions, false),
                factor!("on-rrp-buffer-risk", "ON RRP Buffer Risk", "on-rrp-buffer-risk", Decimal(4), false),
                factor!("fed-total-assets", "Fed Total Assets", "WALCL", UsdBillions, false, true),
                factor!("treasury-general-account", "Treasury General Account", "WDTGAL", UsdBillions, false, true),
                factor!("on-rrp", "ON RRP", "RRPONTSYD", UsdBillions, false, true),
            ],
        },
        ModuleSpec {
            slug: "funding".to_string(),
            name: "Funding".to_string(),
            factors: vec![
                factor!("collateral-repo-friction", "Collateral/Repo Friction", "collateral-repo-friction", Percent(4), true),
                factor!("corridor-friction-1", "Corridor Friction 1", "corridor-friction-1", Percent(4), true),
                factor!("corridor-friction-2", "Corridor Friction 2", "corridor-friction-2", Percent(4), true),
                factor!("effr-iorb-spread", "EFFR−IORB Spread", "effr-iorb-spread", Percent(4), true),
                factor!("cp-tbill-spread", "CP-TBill Spread", "cp-tbill-spread", Percent(4), true),
                factor!("funding-fragmentation", "Funding Fragmentation (21D)", "funding-fragmentation", Decimal(4), false),
                factor!("effr", "EFFR", "DFF", Percent(2), true, true),
                factor!("sofr", "SOFR", "SOFR", Percent(2), true, true),
                factor!("iorb", "IORB", "IORB", Percent(2), true, true),
                factor!("on-rrp-award-rate", "ON RRP Award Rate", "on-rrp-award-rate", Percent(2), true, true),
                factor!("obfr-rate", "OBFR Rate", "OBFR", Percent(2), true, true),
            ],
        },
        ModuleSpec {
            slug: "treasury".to_string(),
            name: "Treasury".to_string(),
            factors: vec![
                factor!("30y-10y-term-premium", "30Y-10Y Term Premium", "30y-10y-term-premium", Percent(2), true),
                factor!("10y-rate-volatility", "10Y Rate Volatility (21D)", "10y-rate-volatility", Decimal(4), false),
                factor!("curve-curvature", "Curve Curvature (Abs)", "curve-curvature", Percent(4), true),
                factor!("10y-2y-spread", "10Y-2Y Spread", "10y-2y-spread", Percent(2), true, true),
                factor!("10y-3m-spread", "10Y-3M Spread", "10y-3m-spread", Percent(2), true, true),
                factor!("10y-nominal-rate", "10Y Nominal Rate", "DGS10", Percent(2), true, true),
                factor!("30y-rate", "30Y Rate", "DGS30", Percent(2), true, true),
                factor!("2y-rate", "2Y Rate", "DGS2", Percent(2), true, true),
            ],
        },
        ModuleSpec {
            slug: "rates".to_string(),
            name: "Rates".to_string(),
            factors: vec![
                factor!("real-rate-level", "Real Rate Level", "real-rate-level", Percent(2), true),
                factor!("real-curve", "Real Curve (10Y-5Y)", "real-curve", Percent(2), true),
                factor!("10y-breakeven", "10Y Breakeven", "T10YIE", Percent(2), true),
                factor!("5y-real-rate", "5Y Real Rate", "DFII5", Percent(2), true, true),
                factor!("10y-real-rate", "10Y Real Rate", "DFII10", Percent(2), true, true),
            ],
        },
        ModuleSpec {
            slug: "credit".to_string(),
            name: "Credit".to_string(),
            factors: vec![
                factor!("nfci", "NFCI", "NFCI", Decimal(2), false),
                factor!("hy-credit", "HY Credit", "hy-credit", Percent(2), false),
                factor!("ig-credit", "IG Credit", "ig-credit", Percent(2), false),
                factor!("regional-banks-spy", "Regional Banks vs SPY", "regional-banks-spy", Percent(2), false),
            ],
        },
        ModuleSpec {
            slug: "risk".to_string(),
            name: "Risk".to_string(),
            factors: vec![
                factor!("vix", "VIX", "^VIX", Decimal(2), false),
                factor!("vix-term-structure", "VIX Term Structure", "vix-term-structure", Decimal(4), false),
                factor!("risk-vs-safe", "Risk vs Safe", "risk-vs-safe", Percent(2), false),
                factor!("high-beta-preference", "High-Beta Preference", "high-beta-preference", Percent(2), false),
                factor!("vix-3m", "VIX 3M", "^VIX3M", Decimal(2), false, true),
            ],
        },
        ModuleSpec {
            slug: "external".to_string(),
            name: "External".to_string(),
            factors: vec![
                factor!("dxy", "US Dollar Index (DXY)", "DX-Y.NYB", Decimal(2), false),
                factor!("fx-realized-volatility", "FX Realized Volatility", "fx-realized-volatility", Decimal(4), false),
                factor!("wti-oil", "WTI Oil", "DCOILWTICO", Usd, false),
                factor!("oil-volatility-deviation", "Oil Volatility Deviation", "oil-volatility-deviation", Decimal(3), false),
                factor!("natural-gas", "Natural Gas", "DHHNGSP", Usd, false),
            ],
        },
    ]
});

// ============================================================================
// REGISTRY STRUCT & IMPL
// ============================================================================

pub struct Registry;

impl Registry {
    /// All raw inputs the acquisition layer should deliver
    pub fn get_raw_inputs() -> &'static [RawInput] {
        &RAW_INPUTS
    }

    /// O(1) lookup by key
    pub fn get_raw_input(key: &str) -> Option<&'static RawInput> {
        RAW_INPUT_MAP.get(key).and_then(|&idx| RAW_INPUTS.get(idx))
    }

    pub fn get_by_source(source: SourceType) -> Vec<&'static RawInput> {
        RAW_INPUTS.iter().filter(|r| r.source == source).collect()
    }

    /// The module catalog, in display order
    pub fn get_modules() -> &'static [ModuleSpec] {
        &MODULES
    }

    /// Get calculator for a derived series key
    pub fn get_calculator(key: &str) -> Option<Box<dyn CalculatedIndicator>> {
        let calc: Box<dyn CalculatedIndicator> = match key {
            // Liquidity
            "fed-net-liquidity" => Box::new(LinearCombination::new(
                "fed-net-liquidity",
                &[("WALCL", 1.0), ("WDTGAL", -1.0), ("RRPONTSYD", -1.0)],
            )),
            "net-liquidity-momentum" => {
                Box::new(Momentum::new("net-liquidity-momentum", "fed-net-liquidity", 91).on_calendar_days())
            }
            "tga-deviation" => Box::new(MedianDeviation::new("tga-deviation", "WDTGAL", 365)),
            "on-rrp-buffer-risk" => Box::new(RrpBufferRisk),

            // Funding corridor
            "on-rrp-award-rate" => Box::new(
                // Award rate sits 15bp under IORB (bottom of the target range)
                LinearCombination::new("on-rrp-award-rate", &[("IORB", 1.0)]).with_constant(-0.0015),
            ),
            "collateral-repo-friction" => {
                Box::new(LinearCombination::spread("collateral-repo-friction", "SOFR", "OBFR"))
            }
            "corridor-friction-1" => {
                Box::new(LinearCombination::spread("corridor-friction-1", "SOFR", "IORB"))
            }
            "corridor-friction-2" => Box::new(LinearCombination::spread(
                "corridor-friction-2",
                "SOFR",
                "on-rrp-award-rate",
            )),
            "effr-iorb-spread" => Box::new(LinearCombination::spread("effr-iorb-spread", "DFF", "IORB")),
            "cp-tbill-spread" => Box::new(LinearCombination::spread("cp-tbill-spread", "DCPF3M", "DGS3MO")),
            "funding-fragmentation" => Box::new(FundingFragmentation::default()),

            // Treasury
            "30y-10y-term-premium" => {
                Box::new(LinearCombination::spread("30y-10y-term-premium", "DGS30", "DGS10"))
            }
            "10y-rate-volatility" => Box::new(RealizedVolatility::of_changes(
                "10y-rate-volatility",
                "DGS10",
                21,
                100.0,
            )),
            "curve-curvature" => Box::new(
                LinearCombination::new("curve-curvature", &[("DGS10", 2.0), ("DGS2", -1.0), ("DGS30", -1.0)])
                    .absolute(),
            ),
            "10y-2y-spread" => Box::new(LinearCombination::spread("10y-2y-spread", "DGS10", "DGS2")),
            "10y-3m-spread" => Box::new(LinearCombination::spread("10y-3m-spread", "DGS10", "DGS3MO")),

            // Real rates
            "real-rate-level" => Box::new(LinearCombination::new(
                "real-rate-level",
                &[("DFII5", 0.6), ("DFII10", 0.4)],
            )),
            "real-curve" => Box::new(LinearCombination::spread("real-curve", "DFII10", "DFII5")),

            // Credit & risk appetite (63-day relative log returns)
            "hy-credit" => Box::new(RelativeReturn::new("hy-credit", "HYG", "IEI")),
            "ig-credit" => Box::new(RelativeReturn::new("ig-credit", "LQD", "IEF")),
            "regional-banks-spy" => Box::new(RelativeReturn::new("regional-banks-spy", "KRE", "SPY")),
            "risk-vs-safe" => Box::new(RelativeReturn::new("risk-vs-safe", "SPY", "TLT")),
            "high-beta-preference" => Box::new(RelativeReturn::new("high-beta-preference", "IWM", "SPY")),
            "vix-term-structure" => Box::new(Ratio::new("vix-term-structure", "^VIX", "^VIX3M")),

            // External
            "fx-realized-volatility" => Box::new(RealizedVolatility::annualized(
                "fx-realized-volatility",
                "DX-Y.NYB",
                63,
            )),
            "oil-volatility-deviation" => {
                Box::new(MedianDeviation::new("oil-volatility-deviation", "^OVX", 252).floored())
            }

            _ => return None,
        };
        Some(calc)
    }

    /// Get count statistics
    pub fn get_stats() -> RegistryStats {
        let factors = MODULES.iter().flat_map(|m| m.factors.iter());
        RegistryStats {
            raw_inputs: RAW_INPUTS.len(),
            fred: Self::get_by_source(SourceType::Fred).len(),
            yahoo: Self::get_by_source(SourceType::Yahoo).len(),
            modules: MODULES.len(),
            factors: factors.clone().count(),
            scored: factors.filter(|f| !f.is_extra).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub raw_inputs: usize,
    pub fred: usize,
    pub yahoo: usize,
    pub modules: usize,
    pub factors: usize,
    pub scored: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn resolves(key: &str, depth: usize) -> bool {
        if depth > 8 {
            return false;
        }
        if Registry::get_raw_input(key).is_some() {
            return true;
        }
        match Registry::get_calculator(key) {
            Some(calc) => calc.required_inputs().iter().all(|k| resolves(k, depth + 1)),
            None => false,
        }
    }

    #[test]
    fn test_every_factor_series_resolves_to_raw_inputs() {
        for module in Registry::get_modules() {
            for factor in &module.factors {
                assert!(resolves(&factor.series, 0), "unresolvable series for {}", factor.id);
            }
        }
    }

    #[test]
    fn test_factor_ids_are_unique() {
        let mut seen = HashSet::new();
        for module in Registry::get_modules() {
            for factor in &module.factors {
                assert!(seen.insert(factor.id.clone()), "duplicate factor id {}", factor.id);
            }
        }
    }

    #[test]
    fn test_calculator_slug_matches_key() {
        for module in Registry::get_modules() {
            for factor in &module.factors {
                if let Some(calc) = Registry::get_calculator(&factor.series) {
                    assert_eq!(calc.slug(), factor.series);
                }
            }
        }
    }

    #[test]
    fn test_stats() {
        let stats = Registry::get_stats();
        assert_eq!(stats.raw_inputs, 31);
        assert_eq!(stats.fred, 19);
        assert_eq!(stats.yahoo, 12);
        assert_eq!(stats.modules, 7);
        assert_eq!(stats.factors, 46);
        assert_eq!(stats.scored, 30);
    }
}
