use crate::core::models::ensemble::Ensemble;
use crate::core::models::spin::Spin;
use crate::core::models::tissue::{Tissue, TissueMode};
use nalgebra::Vector3;

/// Net magnetization of the whole ensemble and of each tissue block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total: Vector3<f64>,
    pub water: Vector3<f64>,
    pub fat: Vector3<f64>,
}

impl Default for Aggregate {
    fn default() -> Self {
        Self {
            total: Vector3::zeros(),
            water: Vector3::zeros(),
            fat: Vector3::zeros(),
        }
    }
}

impl Aggregate {
    pub fn of(&self, tissue: Tissue) -> &Vector3<f64> {
        match tissue {
            Tissue::Water => &self.water,
            Tissue::Fat => &self.fat,
        }
    }

    /// Per-tissue net vectors shown under `mode`.
    pub fn visible(
        &self,
        mode: TissueMode,
    ) -> impl Iterator<Item = (Tissue, Vector3<f64>)> + '_ {
        Tissue::ALL
            .into_iter()
            .filter(move |t| mode.shows(*t))
            .map(move |t| (t, *self.of(t)))
    }
}

pub fn aggregate(ensemble: &Ensemble) -> Aggregate {
    Aggregate {
        total: mean(ensemble.spins()),
        water: mean(ensemble.water()),
        fat: mean(ensemble.fat()),
    }
}

fn mean(spins: &[Spin]) -> Vector3<f64> {
    if spins.is_empty() {
        return Vector3::zeros();
    }
    let sum = spins
        .iter()
        .fold(Vector3::zeros(), |acc, s| acc + s.magnetization());
    sum / spins.len() as f64
}
