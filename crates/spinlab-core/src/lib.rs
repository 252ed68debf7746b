//! # Spinlab Core Library
//!
//! An ensemble spin-physics engine for interactive NMR/MRI teaching simulations. A fixed
//! population of magnetic dipoles (water and fat spins) is integrated forward in time under
//! Larmor precession, T1/T2 relaxation, RF excitation and loss of the main field, and reduced
//! to net magnetization vectors and a rolling time series for display.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Spin`, `Ensemble`, tissue
//!   properties), pure physics kernels (precession, relaxation, RF rotation, contrast),
//!   display geometry and CSV export.
//!
//! - **[`engine`]: The Logic Core.** The stateful simulation: the depth-1 command mailbox,
//!   the pulse/slow-motion state machine, the per-tick integrator, the aggregator, the chart
//!   sampler and the double-buffered snapshot view consumed by renderers.
//!
//! - **[`workflows`]: The Public API.** Headless, scripted runs that drive the engine from a
//!   protocol of timed events and collect chart and trace series.
//!
//! Nothing in this crate depends on a rendering or UI technology; renderers read
//! [`engine::snapshot::SimulationSnapshot`] values and push commands through
//! [`engine::command::Controls`].

pub mod core;
pub mod engine;
pub mod workflows;
