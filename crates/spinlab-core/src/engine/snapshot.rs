use super::aggregator::Aggregate;
use super::state::Phase;
use crate::core::models::series::TraceRecord;
use crate::core::models::spin::{Spin, SpinId};
use crate::core::models::tissue::{Tissue, TissueMode};
use crate::core::utils::geometry::{
    ArrowTransform, net_vector_arrow, spin_arrow, to_rotating_frame,
};
use nalgebra::{Point3, Vector3};
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinView {
    pub id: SpinId,
    pub tissue: Tissue,
    pub position: Point3<f64>,
    pub magnetization: Vector3<f64>,
}

impl SpinView {
    pub fn arrow(&self) -> ArrowTransform {
        spin_arrow(&self.position, &self.magnetization)
    }
}

impl From<&Spin> for SpinView {
    fn from(spin: &Spin) -> Self {
        Self {
            id: spin.id(),
            tissue: spin.tissue(),
            position: *spin.position(),
            magnetization: *spin.magnetization(),
        }
    }
}

/// Complete, immutable state of the simulation right after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSnapshot {
    pub tick: u64,
    /// Real (clamped) time processed so far, in seconds.
    pub elapsed: f64,
    /// Time seen by the integrator, shorter than `elapsed` after slow motion.
    pub physics_time: f64,
    pub b0_on: bool,
    pub phase: Phase,
    pub spins: Vec<SpinView>,
    pub aggregate: Aggregate,
}

impl SimulationSnapshot {
    pub fn visible_spins(&self, mode: TissueMode) -> impl Iterator<Item = &SpinView> + '_ {
        self.spins.iter().filter(move |s| mode.shows(s.tissue))
    }

    /// Arrows for the per-tissue net vectors shown under `mode`, skipping vectors too short
    /// to draw.
    pub fn net_arrows(&self, mode: TissueMode) -> Vec<(Tissue, ArrowTransform)> {
        self.aggregate
            .visible(mode)
            .filter_map(|(tissue, v)| net_vector_arrow(&v).map(|arrow| (tissue, arrow)))
            .collect()
    }

    pub fn total_arrow(&self) -> Option<ArrowTransform> {
        net_vector_arrow(&self.aggregate.total)
    }

    /// The same snapshot viewed from a frame rotating about +Z at `freq` cycles per second.
    pub fn in_rotating_frame(&self, freq: f64) -> Self {
        let rotate = |v: &Vector3<f64>| to_rotating_frame(v, self.physics_time, freq);
        Self {
            spins: self
                .spins
                .iter()
                .map(|s| SpinView {
                    magnetization: rotate(&s.magnetization),
                    ..*s
                })
                .collect(),
            aggregate: Aggregate {
                total: rotate(&self.aggregate.total),
                water: rotate(&self.aggregate.water),
                fat: rotate(&self.aggregate.fat),
            },
            ..self.clone()
        }
    }

    pub fn trace_record(&self) -> TraceRecord {
        let Aggregate { total, water, fat } = self.aggregate;
        TraceRecord {
            tick: self.tick,
            time: self.elapsed,
            phase: self.phase.as_str(),
            b0_on: self.b0_on,
            total_x: total.x,
            total_y: total.y,
            total_z: total.z,
            water_x: water.x,
            water_y: water.y,
            water_z: water.z,
            fat_x: fat.x,
            fat_y: fat.y,
            fat_z: fat.z,
        }
    }
}

/// Single-slot buffer through which the tick loop hands snapshots to readers.
///
/// Publishing swaps the shared pointer; readers hold on to whole snapshots and never see a
/// partially updated state.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer {
    current: Arc<RwLock<Arc<SimulationSnapshot>>>,
}

impl SnapshotBuffer {
    pub fn new(initial: SimulationSnapshot) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    pub fn publish(&self, snapshot: SimulationSnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *slot = snapshot;
    }

    pub fn latest(&self) -> Arc<SimulationSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
