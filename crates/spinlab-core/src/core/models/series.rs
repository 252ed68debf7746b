use serde::Serialize;

/// One point of the rolling magnetization chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartSample {
    /// Seconds since the left edge of the current chart window.
    pub time: f64,
    /// Longitudinal magnetization of the total vector, clamped to [0, 1].
    pub mz: f64,
    /// Transverse magnitude of the total vector, clamped to [0, 1].
    pub mxy: f64,
}

/// A flat per-tick record of the three aggregate vectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceRecord {
    pub tick: u64,
    pub time: f64,
    pub phase: &'static str,
    pub b0_on: bool,
    pub total_x: f64,
    pub total_y: f64,
    pub total_z: f64,
    pub water_x: f64,
    pub water_y: f64,
    pub water_z: f64,
    pub fat_x: f64,
    pub fat_y: f64,
    pub fat_z: f64,
}
