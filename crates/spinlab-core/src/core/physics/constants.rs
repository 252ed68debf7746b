use std::f64::consts::TAU;

pub const WATER_T1: f64 = 4.0; // s
pub const WATER_T2: f64 = 2.0; // s
pub const WATER_FREQ: f64 = 1.0; // relative units
pub const FAT_T1: f64 = 1.5; // s
pub const FAT_T2: f64 = 0.4; // s
pub const FAT_FREQ: f64 = 0.93; // relative units

pub const WATER_COUNT: usize = 15;
pub const FAT_COUNT: usize = 15;

/// Longitudinal magnetization at thermal equilibrium.
pub const EQUILIBRIUM_MZ: f64 = 1.0;

pub const RF_PULSE_DURATION: f64 = 0.3; // s
pub const POST_PULSE_SLOWMO_DURATION: f64 = 4.0; // s
pub const POST_PULSE_SLOWMO_SCALE: f64 = 0.35;

pub const B0_NOISE_SCALE: f64 = 0.06;
/// Per-tick retention factor applied to every axis while the main field is off.
pub const B0_LOSS_RETENTION: f64 = 0.92;

/// Half-width of the uniform per-spin frequency jitter, as a fraction of the nominal value.
pub const OMEGA_JITTER: f64 = 0.02;

pub const MAX_TICK_DELTA: f64 = 0.05; // s

pub const CHART_INTERVAL: f64 = 0.1; // s
pub const CHART_WINDOW: f64 = 10.0; // s
pub const CHART_CAPACITY: usize = 100;

pub const RING_BASE_RADIUS: f64 = 0.35;
pub const RING_RADIUS_STEP: f64 = 0.12;
pub const RING_BANDS: usize = 5;

/// Mean of the two tissue frequencies; the rotating frame turns at this rate.
pub const AVERAGE_FREQ: f64 = (WATER_FREQ + FAT_FREQ) / 2.0;

#[inline]
pub fn angular_frequency(freq: f64) -> f64 {
    TAU * freq
}
