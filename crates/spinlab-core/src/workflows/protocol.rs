use crate::engine::command::Controls;
use crate::engine::error::EngineError;
use std::fmt;

const FRAME_COUNT_EPSILON: f64 = 1e-9;

/// A command a protocol can post to the simulation's controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// RF pulse with a flip angle in degrees.
    Pulse { angle: f64 },
    FieldOn,
    FieldOff,
    ToggleField,
    Reset,
}

impl Action {
    pub fn apply(&self, controls: &mut Controls) {
        match *self {
            Action::Pulse { angle } => {
                controls.trigger_pulse(angle);
            }
            Action::FieldOn => controls.set_b0(true),
            Action::FieldOff => controls.set_b0(false),
            Action::ToggleField => {
                controls.toggle_b0();
            }
            Action::Reset => {
                controls.request_reset();
            }
        }
    }

    /// Builds an action from its kebab-case name; `pulse` requires an angle.
    pub fn from_name(name: &str, angle: Option<f64>) -> Result<Self, EngineError> {
        match (name.to_ascii_lowercase().as_str(), angle) {
            ("pulse", Some(angle)) => Ok(Action::Pulse { angle }),
            ("pulse", None) => Err(EngineError::Protocol(
                "a 'pulse' action requires an angle".to_string(),
            )),
            ("field-on", _) => Ok(Action::FieldOn),
            ("field-off", _) => Ok(Action::FieldOff),
            ("toggle-field", _) => Ok(Action::ToggleField),
            ("reset", _) => Ok(Action::Reset),
            (other, _) => Err(EngineError::Protocol(format!(
                "unknown action '{}' (expected pulse, field-on, field-off, toggle-field or reset)",
                other
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Pulse { angle } => write!(f, "pulse {}°", angle),
            Action::FieldOn => f.write_str("field on"),
            Action::FieldOff => f.write_str("field off"),
            Action::ToggleField => f.write_str("toggle field"),
            Action::Reset => f.write_str("reset"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Simulated wall time in seconds.
    pub at: f64,
    pub action: Action,
}

/// A timed script for an unattended run.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    pub duration: f64,
    pub frame_dt: f64,
    /// Record a trace row every this many ticks; `None` disables the trace.
    pub trace_stride: Option<usize>,
    pub events: Vec<ScheduledEvent>,
}

impl Protocol {
    pub fn new(duration: f64, frame_dt: f64) -> Self {
        Self {
            duration,
            frame_dt,
            trace_stride: None,
            events: Vec::new(),
        }
    }

    pub fn with_event(mut self, at: f64, action: Action) -> Self {
        self.events.push(ScheduledEvent { at, action });
        self
    }

    pub fn with_trace_stride(mut self, stride: usize) -> Self {
        self.trace_stride = Some(stride);
        self
    }

    /// Number of frames needed to cover the duration; a final partial frame counts as one.
    ///
    /// Quotients within rounding noise of a whole number snap to it, so `2.1 / 0.3` is seven
    /// frames rather than eight.
    pub fn total_frames(&self) -> u64 {
        let frames = self.duration / self.frame_dt;
        let nearest = frames.round();
        if (frames - nearest).abs() < FRAME_COUNT_EPSILON {
            nearest as u64
        } else {
            frames.ceil() as u64
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(EngineError::Protocol(format!(
                "duration must be finite and positive, got {}",
                self.duration
            )));
        }
        if !self.frame_dt.is_finite() || self.frame_dt <= 0.0 {
            return Err(EngineError::Protocol(format!(
                "frame step must be finite and positive, got {}",
                self.frame_dt
            )));
        }
        if self.trace_stride == Some(0) {
            return Err(EngineError::Protocol(
                "trace stride must be at least 1".to_string(),
            ));
        }
        for (index, event) in self.events.iter().enumerate() {
            if !event.at.is_finite() || event.at < 0.0 {
                return Err(EngineError::ProtocolEvent {
                    index,
                    at: event.at,
                    reason: "time must be finite and non-negative",
                });
            }
            if let Action::Pulse { angle } = event.action {
                if !angle.is_finite() {
                    return Err(EngineError::ProtocolEvent {
                        index,
                        at: event.at,
                        reason: "pulse angle must be finite",
                    });
                }
            }
        }
        Ok(())
    }
}

/// Hands out a protocol's events in time order, ties kept in declaration order.
#[derive(Debug, Clone)]
pub struct ProtocolCursor {
    events: Vec<ScheduledEvent>,
    next: usize,
}

impl ProtocolCursor {
    pub fn new(protocol: &Protocol) -> Self {
        let mut events = protocol.events.clone();
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { events, next: 0 }
    }

    /// Events with `at <= now` not yet handed out.
    pub fn due(&mut self, now: f64) -> &[ScheduledEvent] {
        let start = self.next;
        while self.next < self.events.len() && self.events[self.next].at <= now {
            self.next += 1;
        }
        &self.events[start..self.next]
    }

    pub fn remaining(&self) -> &[ScheduledEvent] {
        &self.events[self.next..]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.events.len()
    }
}
