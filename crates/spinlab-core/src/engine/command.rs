//! The command mailbox shared between a front end and the tick loop.
//!
//! Requests are depth-1: a newer pulse request overwrites an unconsumed older one, and
//! requests are told apart only by their increasing ids.

/// A request to play an RF pulse of `angle` degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRequest {
    pub angle: f64,
    pub id: u64,
}

/// Writer-side controls: the B0 switch plus the pulse and reset mailboxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    b0_on: bool,
    pulse_request: Option<PulseRequest>,
    reset_id: u64,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            b0_on: true,
            pulse_request: None,
            reset_id: 0,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn b0_on(&self) -> bool {
        self.b0_on
    }

    /// Takes effect on the next tick.
    pub fn set_b0(&mut self, on: bool) {
        self.b0_on = on;
    }

    pub fn toggle_b0(&mut self) -> bool {
        self.b0_on = !self.b0_on;
        self.b0_on
    }

    /// Posts a pulse request and returns its id. Replaces any request not yet consumed.
    pub fn trigger_pulse(&mut self, angle: f64) -> u64 {
        let id = self.pulse_request.map_or(0, |r| r.id) + 1;
        self.pulse_request = Some(PulseRequest { angle, id });
        id
    }

    pub fn pulse_request(&self) -> Option<PulseRequest> {
        self.pulse_request
    }

    pub fn request_reset(&mut self) -> u64 {
        self.reset_id += 1;
        self.reset_id
    }

    pub fn reset_id(&self) -> u64 {
        self.reset_id
    }
}

/// Reader-side bookkeeping of the last consumed request ids.
///
/// Reset does not rewind the pulse id, so a request consumed before a reset stays consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandCursor {
    last_pulse_id: u64,
    last_reset_id: u64,
}

impl CommandCursor {
    pub fn take_reset(&mut self, controls: &Controls) -> bool {
        if controls.reset_id > self.last_reset_id {
            self.last_reset_id = controls.reset_id;
            true
        } else {
            false
        }
    }

    pub fn take_pulse(&mut self, controls: &Controls) -> Option<PulseRequest> {
        match controls.pulse_request {
            Some(request) if request.id > self.last_pulse_id => {
                self.last_pulse_id = request.id;
                Some(request)
            }
            _ => None,
        }
    }
}
