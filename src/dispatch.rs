//! Parallel fan-out across biomass states
//!
//! One optimizer invocation per distinct state, spread over the rayon worker
//! pool. Invocations share nothing: each owns its population and its RNG, so
//! the only coordination point is assembling the result map, which is keyed
//! by state and therefore independent of completion order.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;
use serde::Serialize;

use crate::error::PlanError;
use crate::evolve::{optimize, GaConfig, OptimizationResult};
use crate::growth::{GrowthParams, HarvestSchedule, PriceScenario};
use crate::rng::run_rng;
use crate::states::{BiomassKey, GridCell, Quantizer, StateSpace};

/// Everything a planning run needs besides the cells themselves.
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub scenario: PriceScenario,
    pub growth: GrowthParams,
    pub ga: GaConfig,
    pub quantizer: Quantizer,
    pub master_seed: u64,
}

/// Fan-out/fan-in of optimizer invocations plus the broadcast join back onto
/// the cells.
pub struct Planner {
    settings: PlannerSettings,
}

/// State-level results. A state lands either in `results` or in `failed`,
/// never both; a failed invocation does not block the others.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub results: BTreeMap<BiomassKey, OptimizationResult>,
    pub failed: Vec<BiomassKey>,
}

/// The per-cell view after broadcasting state results back.
#[derive(Debug, Clone, Serialize)]
pub struct CellOutcome {
    pub cell: u64,
    pub npv: f64,
    pub schedule: HarvestSchedule,
}

/// End-to-end outcome of one planning run.
#[derive(Debug)]
pub struct PlanOutcome {
    pub results: BTreeMap<BiomassKey, OptimizationResult>,
    pub failed: Vec<BiomassKey>,
    pub cells: Vec<CellOutcome>,
}

impl Planner {
    /// Validates the optimizer configuration up front; a bad budget is
    /// rejected before any state is dispatched.
    pub fn new(settings: PlannerSettings) -> Result<Self, PlanError> {
        settings.ga.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    /// Run one optimizer invocation per key. A panicking invocation is
    /// contained and reported in `failed`; no retries, so reproducibility
    /// semantics stay intact.
    pub fn optimize_states(&self, keys: &[BiomassKey]) -> DispatchOutcome {
        let s = &self.settings;
        let runs: Vec<(BiomassKey, Option<OptimizationResult>)> = keys
            .par_iter()
            .map(|&key| {
                let density = s.quantizer.density(key);
                let run = catch_unwind(AssertUnwindSafe(|| {
                    let mut rng = run_rng(s.master_seed, key);
                    optimize(key, density, &s.scenario, &s.growth, &s.ga, &mut rng)
                }));
                (key, run.ok().and_then(Result::ok))
            })
            .collect();

        let mut results = BTreeMap::new();
        let mut failed = Vec::new();
        for (key, run) in runs {
            match run {
                Some(result) => {
                    results.insert(key, result);
                }
                None => failed.push(key),
            }
        }
        DispatchOutcome { results, failed }
    }

    /// The whole pipeline: validate cells, deduplicate, dispatch, broadcast.
    pub fn plan(&self, cells: &[GridCell]) -> Result<PlanOutcome, PlanError> {
        let space = StateSpace::build(cells, &self.settings.quantizer)?;
        let outcome = self.optimize_states(space.keys());
        let cells = broadcast(&space, &outcome.results);
        Ok(PlanOutcome {
            results: outcome.results,
            failed: outcome.failed,
            cells,
        })
    }
}

/// Two-stage join: cell → key, key → result. Cells whose state failed are
/// omitted rather than given partial data.
pub fn broadcast(
    space: &StateSpace,
    results: &BTreeMap<BiomassKey, OptimizationResult>,
) -> Vec<CellOutcome> {
    space
        .assignments()
        .iter()
        .filter_map(|&(cell, key)| {
            results.get(&key).map(|result| CellOutcome {
                cell,
                npv: result.npv,
                schedule: result.schedule,
            })
        })
        .collect()
}
