//! # Core Module
//!
//! The stateless foundation of Spinlab: data models for spins and tissues, the pure
//! physics kernels applied to a single magnetization vector, display geometry helpers and
//! series export.
//!
//! ## Architecture
//!
//! - **Spin Representation** ([`models`]) - Tissues, spins, the ensemble layout and the
//!   chart/trace records produced by the engine
//! - **Physics Kernels** ([`physics`]) - Precession, relaxation, RF rotation, field-loss
//!   noise, tissue constants and the image contrast model
//! - **Display Geometry** ([`utils`]) - Direction fallbacks, arrow transforms and the
//!   rotating reference frame
//! - **Export** ([`io`]) - CSV writers for chart and trace series
//!
//! ## Scientific Foundation
//!
//! Each spin evolves under an operator-split, first-order form of the Bloch equations:
//! a rotation about the main field axis followed by independent exponential relaxation of
//! the transverse and longitudinal components. Spins do not interact.

pub mod io;
pub mod models;
pub mod physics;
pub mod utils;
