use super::tissue::{Tissue, TissueProperties};
use crate::core::physics::constants::{
    EQUILIBRIUM_MZ, RING_BANDS, RING_BASE_RADIUS, RING_RADIUS_STEP,
};
use nalgebra::{Point3, Vector3};
use rand::Rng;
use std::f64::consts::TAU;

/// Index of a spin within its ensemble. Stable for the lifetime of the ensemble.
pub type SpinId = usize;

/// A single magnetic dipole of the simulated population.
///
/// Only `magnetization` evolves; tissue, frequency and relaxation constants are fixed at
/// construction and exposed read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Spin {
    id: SpinId,
    tissue: Tissue,
    position: Point3<f64>,
    pub(crate) magnetization: Vector3<f64>,
    omega: f64,
    t1: f64,
    t2: f64,
}

impl Spin {
    /// Creates a spin at equilibrium, `(0, 0, 1)`, with its angular frequency drawn as
    /// `2π·freq·(1 + u)`, `u ~ uniform(-jitter, jitter)`.
    ///
    /// # Arguments
    ///
    /// * `id` - Index of the spin in the ensemble.
    /// * `tissue` - The population this spin belongs to.
    /// * `position` - Display anchor; never read by the physics.
    /// * `properties` - Relaxation and frequency constants of `tissue`.
    /// * `jitter` - Relative half-width of the frequency spread.
    /// * `rng` - Random source for the frequency draw.
    pub fn new(
        id: SpinId,
        tissue: Tissue,
        position: Point3<f64>,
        properties: &TissueProperties,
        jitter: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let spread = if jitter > 0.0 {
            rng.gen_range(-jitter..jitter)
        } else {
            0.0
        };
        Self {
            id,
            tissue,
            position,
            magnetization: Vector3::new(0.0, 0.0, EQUILIBRIUM_MZ),
            omega: properties.nominal_omega() * (1.0 + spread),
            t1: properties.t1,
            t2: properties.t2,
        }
    }

    pub fn id(&self) -> SpinId {
        self.id
    }

    pub fn tissue(&self) -> Tissue {
        self.tissue
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn magnetization(&self) -> &Vector3<f64> {
        &self.magnetization
    }

    /// Angular precession frequency in radians per second.
    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn t1(&self) -> f64 {
        self.t1
    }

    pub fn t2(&self) -> f64 {
        self.t2
    }
}

/// Ring layout anchor for spin `index` of `count`: angle `index/count·2π` on a ring of radius
/// `0.35 + (index mod 5)·0.12` in the XY plane.
pub fn ring_position(index: usize, count: usize) -> Point3<f64> {
    let angle = index as f64 / count.max(1) as f64 * TAU;
    let radius = RING_BASE_RADIUS + (index % RING_BANDS) as f64 * RING_RADIUS_STEP;
    Point3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
}
