//! Biomass state deduplication
//!
//! Many grid cells share a near-identical starting stock. Optimizing once per
//! quantized density instead of once per cell keeps the cost proportional to
//! the number of distinct states. Keys are fixed-decimal integers so they can
//! be ordered and hashed without floating-point equality traps.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One grid cell as supplied by the caller. Coordinates are carried through
/// untouched; only `biomass` drives the optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridCell {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    /// Above-ground biomass density, t/ha.
    pub biomass: f64,
}

/// Quantized biomass density. The raw value is the density scaled by the
/// quantizer's decimal factor, e.g. 32.7 t/ha at one decimal place is 327.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BiomassKey(u32);

impl BiomassKey {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Rounds densities to a fixed number of decimal places. One decimal is the
/// default policy; finer granularity multiplies the state count without
/// materially moving the optimum at this resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quantizer {
    decimals: u32,
}

impl Quantizer {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    fn scale(&self) -> f64 {
        10_f64.powi(self.decimals as i32)
    }

    pub fn key(&self, density: f64) -> BiomassKey {
        BiomassKey((density * self.scale()).round() as u32)
    }

    /// Representative density for a key, t/ha.
    pub fn density(&self, key: BiomassKey) -> f64 {
        key.raw() as f64 / self.scale()
    }
}

impl Default for Quantizer {
    fn default() -> Self {
        Self::new(1)
    }
}

/// The reduced state set for a batch of cells: the sorted distinct keys and
/// the key each cell quantized to.
#[derive(Debug, Clone)]
pub struct StateSpace {
    keys: Vec<BiomassKey>,
    assignments: Vec<(u64, BiomassKey)>,
}

impl StateSpace {
    /// Validates every cell and quantizes it. A missing, negative, or
    /// non-finite biomass rejects the whole batch before any optimization
    /// starts; no partial state set is produced.
    pub fn build(cells: &[GridCell], quantizer: &Quantizer) -> Result<Self, PlanError> {
        let mut assignments = Vec::with_capacity(cells.len());
        for cell in cells {
            if !cell.biomass.is_finite() {
                return Err(PlanError::InvalidInput {
                    cell: cell.id,
                    reason: format!("biomass is not a finite number ({})", cell.biomass),
                });
            }
            if cell.biomass < 0.0 {
                return Err(PlanError::InvalidInput {
                    cell: cell.id,
                    reason: format!("biomass is negative ({})", cell.biomass),
                });
            }
            assignments.push((cell.id, quantizer.key(cell.biomass)));
        }

        let mut keys: Vec<BiomassKey> = assignments.iter().map(|&(_, key)| key).collect();
        keys.sort();
        keys.dedup();

        Ok(Self { keys, assignments })
    }

    /// Distinct keys, ascending.
    pub fn keys(&self) -> &[BiomassKey] {
        &self.keys
    }

    /// Per-cell key assignment in input order.
    pub fn assignments(&self) -> &[(u64, BiomassKey)] {
        &self.assignments
    }

    pub fn distinct_count(&self) -> usize {
        self.keys.len()
    }
}
