//! Scenario configuration
//!
//! A scenario file bundles the economic assumptions, the search budget, and
//! the reproducibility seed for one planning run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dispatch::PlannerSettings;
use crate::error::ScenarioError;
use crate::evolve::GaConfig;
use crate::growth::{GrowthParams, PriceScenario};
use crate::states::Quantizer;

/// Main configuration for a planning scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub random_seed: u64,
    pub prices: PriceScenario,
    #[serde(default)]
    pub ga: GaConfig,
    #[serde(default)]
    pub growth: GrowthParams,
    #[serde(default = "default_quantize_decimals")]
    pub quantize_decimals: u32,
}

fn default_quantize_decimals() -> u32 {
    1
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let contents = fs::read_to_string(path)?;
        let scenario: Scenario = serde_yaml::from_str(&contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Save a scenario to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.is_empty() {
            return Err(ScenarioError::Validation(
                "scenario must define a name".into(),
            ));
        }
        for (label, value) in [
            ("fuelwood price", self.prices.fuelwood_price),
            ("carbon price", self.prices.carbon_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::Validation(format!(
                    "{label} must be a non-negative number, got {value}"
                )));
            }
        }
        if !self.prices.discount_rate.is_finite() || self.prices.discount_rate < 0.0 {
            return Err(ScenarioError::Validation(format!(
                "discount rate must be a non-negative fraction, got {}",
                self.prices.discount_rate
            )));
        }
        self.ga
            .validate()
            .map_err(|err| ScenarioError::Validation(err.to_string()))?;
        Ok(())
    }

    /// Planner settings for this scenario.
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            scenario: self.prices,
            growth: self.growth,
            ga: self.ga,
            quantizer: Quantizer::new(self.quantize_decimals),
            master_seed: self.random_seed,
        }
    }

    /// The baseline scenario for the Desa'a fuelwood study.
    pub fn desaa_baseline() -> Self {
        Self {
            name: "desaa_baseline".to_string(),
            random_seed: 7,
            prices: PriceScenario {
                fuelwood_price: 32.10,
                carbon_price: 5.0,
                discount_rate: 0.07,
            },
            ga: GaConfig::default(),
            growth: GrowthParams::default(),
            quantize_decimals: 1,
        }
    }
}
