//! Evolutionary search over harvest schedules
//!
//! A small generational GA: rank-based truncation selection over the top
//! half, two elites carried forward unchanged, single-point crossover and
//! single-gene mutation. Termination is a fixed generation count, a bounded
//! computational budget rather than a convergence test.

use std::cmp::Ordering;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::growth::{evaluate, GrowthParams, HarvestSchedule, PriceScenario, HORIZON_YEARS};
use crate::states::BiomassKey;

/// Upper bound for a freshly drawn gene, t/ha/yr. High enough that a clear
/// cut of any realistic stand stays reachable by a single draw.
pub const MAX_GENE: f64 = 50.0;

/// Search budget and operators for one optimizer invocation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GaConfig {
    pub population_size: usize,
    pub generations: u32,
    pub mutation_rate: f64,
}

impl GaConfig {
    /// Rejects budgets the loop cannot run with. Called once before dispatch.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.population_size < 2 {
            return Err(PlanError::Configuration(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.generations < 1 {
            return Err(PlanError::Configuration(
                "generations must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) || !self.mutation_rate.is_finite() {
            return Err(PlanError::Configuration(format!(
                "mutation_rate must lie in [0, 1], got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 80,
            mutation_rate: 0.15,
        }
    }
}

/// Best schedule found for one biomass state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub state: BiomassKey,
    pub npv: f64,
    pub schedule: HarvestSchedule,
}

#[derive(Debug, Clone)]
struct Individual {
    genes: HarvestSchedule,
    fitness: Option<f64>,
}

impl Individual {
    fn random(rng: &mut ChaCha8Rng) -> Self {
        let mut genes = [0.0; HORIZON_YEARS];
        for gene in &mut genes {
            *gene = rng.gen_range(0.0..MAX_GENE);
        }
        Self {
            genes,
            fitness: None,
        }
    }

    fn scored(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Evolve a schedule for the stand density represented by `state`.
///
/// The caller supplies the invocation's private RNG (see [`crate::rng`]);
/// two calls with identical arguments and identically seeded generators
/// return the identical result.
pub fn optimize(
    state: BiomassKey,
    density: f64,
    scenario: &PriceScenario,
    params: &GrowthParams,
    ga: &GaConfig,
    rng: &mut ChaCha8Rng,
) -> Result<OptimizationResult, PlanError> {
    ga.validate()?;

    let mut population: Vec<Individual> = (0..ga.population_size)
        .map(|_| Individual::random(rng))
        .collect();

    for _ in 0..ga.generations {
        score(&mut population, density, scenario, params);
        rank(&mut population);

        let parents = &population[..ga.population_size / 2];
        let mut next = Vec::with_capacity(ga.population_size);
        // Elites keep their genes and cached score; the simulator is
        // deterministic, so the cache equals a fresh re-evaluation.
        next.extend(parents.iter().take(2).cloned());

        while next.len() < ga.population_size {
            let p1 = &parents[rng.gen_range(0..parents.len())];
            let p2 = &parents[rng.gen_range(0..parents.len())];
            let cut = rng.gen_range(1..HORIZON_YEARS - 1);
            let mut genes = p1.genes;
            genes[cut..].copy_from_slice(&p2.genes[cut..]);

            if rng.gen_bool(ga.mutation_rate) {
                let idx = rng.gen_range(0..HORIZON_YEARS);
                genes[idx] = rng.gen_range(0.0..MAX_GENE);
            }

            next.push(Individual {
                genes,
                fitness: None,
            });
        }
        population = next;
    }

    score(&mut population, density, scenario, params);
    let best = population
        .iter()
        .max_by(|a, b| a.scored().partial_cmp(&b.scored()).unwrap_or(Ordering::Equal))
        .expect("population is never empty");

    Ok(OptimizationResult {
        state,
        npv: best.scored(),
        schedule: best.genes,
    })
}

fn score(
    population: &mut [Individual],
    density: f64,
    scenario: &PriceScenario,
    params: &GrowthParams,
) {
    for individual in population.iter_mut() {
        if individual.fitness.is_none() {
            individual.fitness = Some(evaluate(&individual.genes, density, scenario, params));
        }
    }
}

fn rank(population: &mut [Individual]) {
    population.sort_by(|a, b| b.scored().partial_cmp(&a.scored()).unwrap_or(Ordering::Equal));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::run_rng;
    use crate::states::Quantizer;

    fn scenario() -> PriceScenario {
        PriceScenario {
            fuelwood_price: 32.10,
            carbon_price: 5.0,
            discount_rate: 0.07,
        }
    }

    fn small_ga() -> GaConfig {
        GaConfig {
            population_size: 20,
            generations: 15,
            mutation_rate: 0.15,
        }
    }

    #[test]
    fn rejects_tiny_population() {
        let ga = GaConfig {
            population_size: 1,
            ..GaConfig::default()
        };
        assert!(ga.validate().is_err());
    }

    #[test]
    fn rejects_zero_generations() {
        let ga = GaConfig {
            generations: 0,
            ..GaConfig::default()
        };
        assert!(ga.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_mutation_rate() {
        let ga = GaConfig {
            mutation_rate: 1.5,
            ..GaConfig::default()
        };
        assert!(ga.validate().is_err());
        let ga = GaConfig {
            mutation_rate: -0.1,
            ..GaConfig::default()
        };
        assert!(ga.validate().is_err());
    }

    #[test]
    fn same_rng_stream_reproduces_the_result() {
        let quantizer = Quantizer::default();
        let key = quantizer.key(20.0);
        let params = GrowthParams::default();
        let a = optimize(
            key,
            20.0,
            &scenario(),
            &params,
            &small_ga(),
            &mut run_rng(7, key),
        )
        .unwrap();
        let b = optimize(
            key,
            20.0,
            &scenario(),
            &params,
            &small_ga(),
            &mut run_rng(7, key),
        )
        .unwrap();
        assert_eq!(a.npv.to_bits(), b.npv.to_bits());
        assert_eq!(a.schedule, b.schedule);
    }

    #[test]
    fn result_never_regresses_below_the_initial_generation() {
        // Replay the INIT draws with an identically seeded generator: the
        // returned best must dominate the best of generation zero, because
        // elites are carried forward and scoring is deterministic.
        let quantizer = Quantizer::default();
        let key = quantizer.key(25.0);
        let params = GrowthParams::default();
        let ga = small_ga();

        let mut replay = run_rng(11, key);
        let gen_zero_best = (0..ga.population_size)
            .map(|_| Individual::random(&mut replay))
            .map(|ind| evaluate(&ind.genes, 25.0, &scenario(), &params))
            .fold(f64::NEG_INFINITY, f64::max);

        let result = optimize(
            key,
            25.0,
            &scenario(),
            &params,
            &ga,
            &mut run_rng(11, key),
        )
        .unwrap();
        assert!(result.npv >= gen_zero_best);
    }

    #[test]
    fn genes_stay_within_draw_bounds() {
        let quantizer = Quantizer::default();
        let key = quantizer.key(15.0);
        let result = optimize(
            key,
            15.0,
            &scenario(),
            &GrowthParams::default(),
            &small_ga(),
            &mut run_rng(3, key),
        )
        .unwrap();
        for gene in result.schedule {
            assert!((0.0..=MAX_GENE).contains(&gene));
        }
    }
}
