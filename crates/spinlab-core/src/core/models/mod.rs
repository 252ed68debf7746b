//! # Models Module
//!
//! Plain data structures describing the simulated population.
//!
//! - [`tissue`] - Tissue kinds, their relaxation/frequency constants and display filters
//! - [`spin`] - A single magnetic dipole and its ring-layout anchor
//! - [`ensemble`] - The ordered water-then-fat population rebuilt on every reset
//! - [`series`] - Records emitted by the engine for charts and traces

pub mod ensemble;
pub mod series;
pub mod spin;
pub mod tissue;
