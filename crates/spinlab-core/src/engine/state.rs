use super::config::PulseConfig;
use std::fmt;

/// Externally visible mode of the pulse state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    Pulsing,
    SlowMotion,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Pulsing => "pulsing",
            Phase::SlowMotion => "slow-motion",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PulseState {
    pub active: bool,
    /// Flip angle in radians.
    pub angle: f64,
    pub elapsed: f64,
    pub duration: f64,
}

impl PulseState {
    pub fn remaining(&self) -> f64 {
        (self.duration - self.elapsed).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlowMotionState {
    pub remaining: f64,
}

impl SlowMotionState {
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }
}

/// What one tick of the state machine asks the integrator to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickPlan {
    /// Time step handed to the Bloch integrator.
    pub physics_dt: f64,
    /// RF rotation about +X to apply before integrating, in radians.
    pub rf_angle: Option<f64>,
    /// Whether the in-flight pulse finished during this tick.
    pub pulse_completed: bool,
}

/// Tracks the in-flight RF pulse and the post-pulse slow-motion window.
#[derive(Debug, Clone, PartialEq)]
pub struct PulseMachine {
    config: PulseConfig,
    pulse: PulseState,
    slow_motion: SlowMotionState,
}

impl PulseMachine {
    pub fn new(config: PulseConfig) -> Self {
        Self {
            config,
            pulse: PulseState::default(),
            slow_motion: SlowMotionState::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.pulse.active {
            Phase::Pulsing
        } else if self.slow_motion.is_active() {
            Phase::SlowMotion
        } else {
            Phase::Idle
        }
    }

    pub fn pulse(&self) -> &PulseState {
        &self.pulse
    }

    pub fn slow_motion(&self) -> &SlowMotionState {
        &self.slow_motion
    }

    /// Starts a pulse of `angle_deg` degrees, replacing one already in flight. A running
    /// slow-motion window is left to count down.
    pub fn start(&mut self, angle_deg: f64) {
        self.pulse = PulseState {
            active: true,
            angle: angle_deg.to_radians(),
            elapsed: 0.0,
            duration: self.config.rf_duration,
        };
    }

    pub fn clear(&mut self) {
        self.pulse = PulseState::default();
        self.slow_motion = SlowMotionState::default();
    }

    /// Advances the machine by a real time step `dt`.
    ///
    /// Slow motion is decided from the state at the start of the tick, so the tick that
    /// completes a pulse still integrates at full rate. The final pulse step is shortened
    /// to the time left, which makes the total rotation equal the requested angle.
    pub fn advance(&mut self, dt: f64) -> TickPlan {
        let mut physics_dt = dt;
        if self.slow_motion.is_active() {
            physics_dt = dt * self.config.slowmo_scale;
            self.slow_motion.remaining = (self.slow_motion.remaining - dt).max(0.0);
        }

        let mut rf_angle = None;
        let mut pulse_completed = false;
        if self.pulse.active {
            let remaining = self.pulse.remaining();
            let step = dt.min(remaining);
            rf_angle = Some(self.pulse.angle / self.pulse.duration * step);
            self.pulse.elapsed += step;
            if dt >= remaining {
                self.pulse.active = false;
                self.pulse.elapsed = self.pulse.duration;
                self.slow_motion.remaining = self.config.slowmo_duration;
                pulse_completed = true;
            }
        }

        TickPlan {
            physics_dt,
            rf_angle,
            pulse_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const TOLERANCE: f64 = 1e-9;

    fn machine() -> PulseMachine {
        PulseMachine::new(PulseConfig::default())
    }

    #[test]
    fn idle_machine_passes_time_through() {
        let mut m = machine();
        let plan = m.advance(0.02);
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(plan.physics_dt, 0.02);
        assert_eq!(plan.rf_angle, None);
        assert!(!plan.pulse_completed);
    }

    #[test]
    fn pulse_rotates_by_exact_angle_over_its_duration() {
        let mut m = machine();
        m.start(90.0);
        assert_eq!(m.phase(), Phase::Pulsing);

        let mut total = 0.0;
        let mut completed_ticks = 0;
        for _ in 0..20 {
            let plan = m.advance(0.04);
            total += plan.rf_angle.unwrap_or(0.0);
            if plan.pulse_completed {
                completed_ticks += 1;
            }
        }
        assert!((total - FRAC_PI_2).abs() < TOLERANCE);
        assert_eq!(completed_ticks, 1);
    }

    #[test]
    fn completion_opens_slow_motion_window() {
        let mut m = machine();
        m.start(90.0);
        let plan = m.advance(0.3);
        assert!(plan.pulse_completed);
        assert_eq!(plan.physics_dt, 0.3);
        assert_eq!(m.phase(), Phase::SlowMotion);
        assert_eq!(m.slow_motion().remaining, 4.0);

        let plan = m.advance(0.05);
        assert!((plan.physics_dt - 0.05 * 0.35).abs() < TOLERANCE);
        assert!((m.slow_motion().remaining - 3.95).abs() < TOLERANCE);
    }

    #[test]
    fn slow_motion_expires_back_to_idle() {
        let mut m = machine();
        m.start(90.0);
        m.advance(0.3);
        for _ in 0..81 {
            m.advance(0.05);
        }
        assert_eq!(m.phase(), Phase::Idle);
        assert_eq!(m.slow_motion().remaining, 0.0);
        assert_eq!(m.advance(0.05).physics_dt, 0.05);
    }

    #[test]
    fn pulse_during_slow_motion_keeps_window_running() {
        let mut m = machine();
        m.start(90.0);
        m.advance(0.3);
        m.advance(1.0);
        m.start(180.0);
        assert_eq!(m.phase(), Phase::Pulsing);

        let plan = m.advance(0.05);
        assert!((plan.physics_dt - 0.05 * 0.35).abs() < TOLERANCE);
        assert!((m.slow_motion().remaining - 2.95).abs() < TOLERANCE);
    }

    #[test]
    fn zero_length_tick_changes_nothing() {
        let mut m = machine();
        m.start(90.0);
        let plan = m.advance(0.0);
        assert_eq!(plan.rf_angle, Some(0.0));
        assert_eq!(plan.physics_dt, 0.0);
        assert!(!plan.pulse_completed);
        assert_eq!(m.pulse().elapsed, 0.0);
    }

    #[test]
    fn clear_drops_pulse_and_slow_motion() {
        let mut m = machine();
        m.start(90.0);
        m.advance(0.3);
        m.start(90.0);
        m.clear();
        assert_eq!(m.phase(), Phase::Idle);
        assert!(!m.pulse().active);
    }
}
