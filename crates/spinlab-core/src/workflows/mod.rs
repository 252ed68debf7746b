//! # Workflows Module
//!
//! High-level entry points that drive a [`Simulation`](crate::engine::simulation::Simulation)
//! without an interactive front end.
//!
//! ## Architecture
//!
//! - **Protocols** ([`protocol`]) - Timed scripts of pulses, field switches and resets
//! - **Protocol Runner** ([`run`]) - Plays a protocol in fixed frames and collects the chart
//!   series, an optional per-tick trace and the final snapshot

pub mod protocol;
pub mod run;
