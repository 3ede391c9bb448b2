use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::config::ScoringConfig;
use super::store::SeriesStore;
use super::timeseries::TimeSeries;
use crate::analysis::aggregate::{update_stamps, IndexAggregator, ModuleAggregator, TREND_DAYS};
use crate::analysis::attribution::attribute;
use crate::analysis::classify::Status;
use crate::analysis::scorer::{FactorScorer, ScoredFactor};
use crate::error::Result;
use crate::indicators::registry::{ModuleSpec, Registry};
use crate::models::Dashboard;

/// Calculated series may build on other calculated series; this bounds the
/// chain so a miswired catalog cannot recurse forever.
const MAX_DERIVATION_DEPTH: usize = 8;

/// Resolves a series key to a clean series: a stored raw input, or a
/// calculated series built recursively from its inputs. Each calculated
/// series is computed once per run.
struct SeriesResolver<'a> {
    store: &'a SeriesStore,
    derived: HashMap<String, TimeSeries>,
}

impl<'a> SeriesResolver<'a> {
    fn new(store: &'a SeriesStore) -> Self {
        Self {
            store,
            derived: HashMap::new(),
        }
    }

    fn resolve(&mut self, key: &str) -> TimeSeries {
        self.resolve_at(key, 0)
    }

    fn resolve_at(&mut self, key: &str, depth: usize) -> TimeSeries {
        if let Some(series) = self.store.get(key) {
            return series.clone();
        }
        if let Some(series) = self.derived.get(key) {
            return series.clone();
        }
        if depth > MAX_DERIVATION_DEPTH {
            warn!("Series '{}' exceeds derivation depth {}", key, MAX_DERIVATION_DEPTH);
            return TimeSeries::default();
        }
        let Some(calculator) = Registry::get_calculator(key) else {
            debug!("Series '{}' unavailable", key);
            return TimeSeries::default();
        };

        let inputs: Vec<TimeSeries> = calculator
            .required_inputs()
            .into_iter()
            .map(|input| self.resolve_at(input, depth + 1))
            .collect();
        let refs: Vec<&TimeSeries> = inputs.iter().collect();
        let series = calculator.calculate(&refs).dropna();
        debug!("Derived '{}': {} observations", key, series.len());

        self.derived.insert(key.to_string(), series.clone());
        series
    }
}

/// Raw series -> factor scores -> module scores -> overall index -> lift/drag.
///
/// A run is a pure function of the store contents, the configuration and the
/// as-of date.
pub struct Pipeline {
    config: ScoringConfig,
}

impl Pipeline {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Scores the registry catalog.
    pub fn run(&self, store: &SeriesStore, as_of: NaiveDate) -> Result<Dashboard> {
        self.run_with_catalog(Registry::get_modules(), store, as_of)
    }

    pub fn run_with_catalog(&self, catalog: &[ModuleSpec], store: &SeriesStore, as_of: NaiveDate) -> Result<Dashboard> {
        self.config.check_catalog(catalog)?;
        let store = store.until(as_of);
        let mut resolver = SeriesResolver::new(&store);

        let scorer = FactorScorer::new(&self.config);
        let module_aggregator = ModuleAggregator::new(&self.config);

        let mut modules = Vec::with_capacity(catalog.len());
        for spec in catalog {
            let factors: Vec<ScoredFactor> = spec
                .factors
                .iter()
                .filter_map(|factor| {
                    let series = resolver.resolve(&factor.series);
                    scorer.score(factor, &series, as_of)
                })
                .collect();
            if let Some(module) = module_aggregator.aggregate(spec, factors, as_of) {
                modules.push(module);
            }
        }
        if modules.is_empty() {
            warn!("No module could be scored as of {}", as_of);
        }

        let index = IndexAggregator::new(&self.config).aggregate(&modules, as_of);
        let lift_drag = attribute(&modules, &index.module_weights, &index.history);
        info!(
            "Overall score {:.1} (prev {:.1}) from {} modules; {} lift / {} drag",
            index.score,
            index.summary.prev_score,
            modules.len(),
            lift_drag.lift.len(),
            lift_drag.drag.len()
        );

        let (last_updated, updated_at) = update_stamps(as_of);
        Ok(Dashboard {
            as_of,
            score: index.score,
            prev_score: index.summary.prev_score,
            seven_day_change_pct: index.summary.seven_day_change_pct,
            trend_days: TREND_DAYS,
            trend_direction: index.summary.trend_direction,
            percentile_5y: index.summary.percentile_5y,
            status: Status::from_score(index.score),
            last_updated,
            updated_at,
            trend_data: index.summary.trend_data.clone(),
            modules: modules
                .iter()
                .zip(&index.module_weights)
                .map(|(m, w)| m.report(*w, as_of))
                .collect(),
            score_lift: lift_drag.lift,
            score_drag: lift_drag.drag,
        })
    }
}
