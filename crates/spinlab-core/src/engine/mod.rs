//! # Engine Module
//!
//! The stateful simulation layer: it owns the spin ensemble and advances it one tick at a
//! time in response to commands from a UI or a scripted protocol.
//!
//! ## Overview
//!
//! Each tick runs in a fixed order with a single writer:
//!
//! 1. pending commands are resolved (reset first, then a new pulse request),
//! 2. the pulse state machine plans the tick (slow-motion scale, RF step),
//! 3. the RF rotation and the per-spin integrator update every magnetization,
//! 4. the aggregator recomputes the three net vectors.
//!
//! Readers never touch this state directly; they consume immutable snapshots, while the
//! chart sampler runs on its own, slower cadence.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated physical and timing parameters
//! - **Commands** ([`command`]) - The depth-1 pulse/reset/field mailbox and its cursor
//! - **Pulse State Machine** ([`state`]) - In-flight RF pulses and the slow-motion window
//! - **Integration** ([`integrator`]) - Per-spin precession, relaxation and field loss
//! - **Aggregation** ([`aggregator`]) - Total, water and fat mean vectors
//! - **Charting** ([`sampler`]) - The bounded, time-windowed magnetization series
//! - **Snapshots** ([`snapshot`]) - Immutable post-tick views and the double buffer
//! - **Orchestration** ([`simulation`]) - The tick loop tying everything together
//! - **Progress Monitoring** ([`progress`]) - Run progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod aggregator;
pub mod command;
pub mod config;
pub mod error;
pub mod integrator;
pub mod progress;
pub mod sampler;
pub mod simulation;
pub mod snapshot;
pub mod state;
