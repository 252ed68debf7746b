use super::spin::{Spin, ring_position};
use super::tissue::{Tissue, TissueTable};
use crate::core::physics::constants::{FAT_COUNT, OMEGA_JITTER, WATER_COUNT};
use rand::Rng;

/// Everything needed to (re)build an ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleSpec {
    pub water_count: usize,
    pub fat_count: usize,
    pub tissues: TissueTable,
    /// Relative half-width of the per-spin frequency spread.
    pub omega_jitter: f64,
}

impl EnsembleSpec {
    pub fn total(&self) -> usize {
        self.water_count + self.fat_count
    }
}

impl Default for EnsembleSpec {
    fn default() -> Self {
        Self {
            water_count: WATER_COUNT,
            fat_count: FAT_COUNT,
            tissues: TissueTable::default(),
            omega_jitter: OMEGA_JITTER,
        }
    }
}

/// The ordered spin population: a block of water spins followed by a block of fat spins.
///
/// The ensemble is never resized; a reset replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Ensemble {
    spins: Vec<Spin>,
    water_count: usize,
}

impl Ensemble {
    pub fn build(spec: &EnsembleSpec, rng: &mut impl Rng) -> Self {
        let total = spec.total();
        let spins = (0..total)
            .map(|i| {
                let tissue = if i < spec.water_count {
                    Tissue::Water
                } else {
                    Tissue::Fat
                };
                Spin::new(
                    i,
                    tissue,
                    ring_position(i, total),
                    spec.tissues.get(tissue),
                    spec.omega_jitter,
                    rng,
                )
            })
            .collect();
        Self {
            spins,
            water_count: spec.water_count,
        }
    }

    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    pub(crate) fn spins_mut(&mut self) -> &mut [Spin] {
        &mut self.spins
    }

    pub fn len(&self) -> usize {
        self.spins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    pub fn water_count(&self) -> usize {
        self.water_count
    }

    pub fn fat_count(&self) -> usize {
        self.spins.len() - self.water_count
    }

    pub fn water(&self) -> &[Spin] {
        &self.spins[..self.water_count]
    }

    pub fn fat(&self) -> &[Spin] {
        &self.spins[self.water_count..]
    }
}
