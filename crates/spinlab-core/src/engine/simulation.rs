use super::aggregator::{Aggregate, aggregate};
use super::command::{CommandCursor, Controls};
use super::config::{SimulationConfig, StepPolicy};
use super::integrator;
use super::snapshot::{SimulationSnapshot, SpinView};
use super::state::{Phase, PulseMachine, PulseState, SlowMotionState};
use crate::core::models::ensemble::Ensemble;
use crate::core::models::series::TraceRecord;
use rand::Rng;
use tracing::{debug, trace};

// Remainders shorter than this are not worth another sub-step.
const SUB_STEP_EPSILON: f64 = 1e-12;

/// The single writer of spin state.
///
/// Front ends post commands through [`controls_mut`](Self::controls_mut) and drive time with
/// [`advance`](Self::advance); everything else is read-only.
pub struct Simulation<R: Rng> {
    config: SimulationConfig,
    rng: R,
    ensemble: Ensemble,
    controls: Controls,
    cursor: CommandCursor,
    machine: PulseMachine,
    aggregate: Aggregate,
    tick: u64,
    elapsed: f64,
    physics_time: f64,
}

impl<R: Rng> Simulation<R> {
    pub fn new(config: SimulationConfig, mut rng: R) -> Self {
        let ensemble = Ensemble::build(&config.ensemble, &mut rng);
        let aggregate = aggregate(&ensemble);
        debug!(
            spins = ensemble.len(),
            water = ensemble.water_count(),
            fat = ensemble.fat_count(),
            "Built spin ensemble."
        );
        Self {
            machine: PulseMachine::new(config.pulse),
            config,
            rng,
            ensemble,
            controls: Controls::default(),
            cursor: CommandCursor::default(),
            aggregate,
            tick: 0,
            elapsed: 0.0,
            physics_time: 0.0,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn pulse(&self) -> &PulseState {
        self.machine.pulse()
    }

    pub fn slow_motion(&self) -> &SlowMotionState {
        self.machine.slow_motion()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn physics_time(&self) -> f64 {
        self.physics_time
    }

    /// Advances by one frame of `delta` seconds according to the configured
    /// [`StepPolicy`] and returns the number of ticks run.
    ///
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, delta: f64) -> usize {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        let ceiling = self.config.timing.max_tick_delta;
        match self.config.timing.step_policy {
            StepPolicy::Clamp => {
                self.tick(delta);
                1
            }
            StepPolicy::SubStep { max_steps } => {
                let mut remaining = delta;
                let mut steps = 0;
                loop {
                    let dt = remaining.min(ceiling);
                    self.tick(dt);
                    steps += 1;
                    remaining -= dt;
                    if remaining <= SUB_STEP_EPSILON || steps >= max_steps {
                        break;
                    }
                }
                if remaining > SUB_STEP_EPSILON {
                    debug!(dropped = remaining, max_steps, "Sub-step cap reached.");
                }
                steps
            }
        }
    }

    /// Runs a single tick of at most `max_tick_delta` seconds.
    pub fn tick(&mut self, dt: f64) {
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.timing.max_tick_delta)
        } else {
            0.0
        };
        self.resolve_commands();

        let plan = self.machine.advance(dt);
        if let Some(angle) = plan.rf_angle {
            integrator::apply_rf(&mut self.ensemble, angle);
        }
        let b0_on = self.controls.b0_on();
        integrator::integrate(
            &mut self.ensemble,
            plan.physics_dt,
            b0_on,
            &self.config.field_loss,
            &mut self.rng,
        );
        self.aggregate = aggregate(&self.ensemble);

        self.tick += 1;
        self.elapsed += dt;
        self.physics_time += plan.physics_dt;

        if plan.pulse_completed {
            debug!(
                tick = self.tick,
                slowmo = self.config.pulse.slowmo_duration,
                "RF pulse complete, entering slow motion."
            );
        }
        trace!(
            tick = self.tick,
            dt,
            physics_dt = plan.physics_dt,
            b0_on,
            mz = self.aggregate.total.z,
            "Tick."
        );
    }

    fn resolve_commands(&mut self) {
        if self.cursor.take_reset(&self.controls) {
            self.reset_now();
        }
        if let Some(request) = self.cursor.take_pulse(&self.controls) {
            debug!(angle = request.angle, id = request.id, "Starting RF pulse.");
            self.machine.start(request.angle);
        }
    }

    fn reset_now(&mut self) {
        self.ensemble = Ensemble::build(&self.config.ensemble, &mut self.rng);
        self.machine.clear();
        self.aggregate = aggregate(&self.ensemble);
        debug!(tick = self.tick, "Ensemble reset to equilibrium.");
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            physics_time: self.physics_time,
            b0_on: self.controls.b0_on(),
            phase: self.phase(),
            spins: self.ensemble.spins().iter().map(SpinView::from).collect(),
            aggregate: self.aggregate,
        }
    }

    pub fn trace_record(&self) -> TraceRecord {
        self.snapshot().trace_record()
    }
}
