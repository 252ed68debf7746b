use crate::core::models::ensemble::EnsembleSpec;
use crate::core::models::tissue::{TissueProperties, TissueTable};
use crate::core::physics::constants::{
    B0_LOSS_RETENTION, B0_NOISE_SCALE, CHART_CAPACITY, CHART_INTERVAL, CHART_WINDOW,
    MAX_TICK_DELTA, POST_PULSE_SLOWMO_DURATION, POST_PULSE_SLOWMO_SCALE, RF_PULSE_DURATION,
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {value} ({requirement})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        requirement: &'static str,
    },
}

/// How a frame longer than the tick ceiling is turned into simulation ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    /// One tick per frame with the delta clamped to the ceiling; excess time is dropped.
    #[default]
    Clamp,
    /// Split the frame into ticks no longer than the ceiling, at most `max_steps` of them.
    SubStep { max_steps: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseConfig {
    /// Duration of an RF pulse in seconds.
    pub rf_duration: f64,
    /// Length of the post-pulse slow-motion window in seconds.
    pub slowmo_duration: f64,
    /// Factor applied to the physics time step during slow motion.
    pub slowmo_scale: f64,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            rf_duration: RF_PULSE_DURATION,
            slowmo_duration: POST_PULSE_SLOWMO_DURATION,
            slowmo_scale: POST_PULSE_SLOWMO_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldLossConfig {
    /// Per-tick retention of every axis while B0 is off.
    pub retention: f64,
    /// Amplitude of the uniform noise added to every axis while B0 is off.
    pub noise_scale: f64,
}

impl Default for FieldLossConfig {
    fn default() -> Self {
        Self {
            retention: B0_LOSS_RETENTION,
            noise_scale: B0_NOISE_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Ceiling on a single tick's real time step, in seconds.
    pub max_tick_delta: f64,
    pub step_policy: StepPolicy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            max_tick_delta: MAX_TICK_DELTA,
            step_policy: StepPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    /// Sampling cadence in seconds.
    pub interval: f64,
    /// Width of the sliding time window in seconds.
    pub window: f64,
    /// Maximum number of retained samples.
    pub capacity: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            interval: CHART_INTERVAL,
            window: CHART_WINDOW,
            capacity: CHART_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationConfig {
    pub ensemble: EnsembleSpec,
    pub pulse: PulseConfig,
    pub field_loss: FieldLossConfig,
    pub timing: TimingConfig,
    pub chart: ChartConfig,
}

/// Builds a [`SimulationConfig`], falling back to the reference constants for anything
/// left unset and validating every value on [`build`](Self::build).
#[derive(Default)]
pub struct SimulationConfigBuilder {
    water_count: Option<usize>,
    fat_count: Option<usize>,
    water: Option<TissueProperties>,
    fat: Option<TissueProperties>,
    omega_jitter: Option<f64>,
    rf_duration: Option<f64>,
    slowmo_duration: Option<f64>,
    slowmo_scale: Option<f64>,
    retention: Option<f64>,
    noise_scale: Option<f64>,
    max_tick_delta: Option<f64>,
    step_policy: Option<StepPolicy>,
    chart_interval: Option<f64>,
    chart_window: Option<f64>,
    chart_capacity: Option<usize>,
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn water_count(mut self, count: usize) -> Self {
        self.water_count = Some(count);
        self
    }
    pub fn fat_count(mut self, count: usize) -> Self {
        self.fat_count = Some(count);
        self
    }
    pub fn water(mut self, properties: TissueProperties) -> Self {
        self.water = Some(properties);
        self
    }
    pub fn fat(mut self, properties: TissueProperties) -> Self {
        self.fat = Some(properties);
        self
    }
    pub fn omega_jitter(mut self, jitter: f64) -> Self {
        self.omega_jitter = Some(jitter);
        self
    }
    pub fn rf_duration(mut self, seconds: f64) -> Self {
        self.rf_duration = Some(seconds);
        self
    }
    pub fn slowmo_duration(mut self, seconds: f64) -> Self {
        self.slowmo_duration = Some(seconds);
        self
    }
    pub fn slowmo_scale(mut self, scale: f64) -> Self {
        self.slowmo_scale = Some(scale);
        self
    }
    pub fn field_loss_retention(mut self, retention: f64) -> Self {
        self.retention = Some(retention);
        self
    }
    pub fn noise_scale(mut self, scale: f64) -> Self {
        self.noise_scale = Some(scale);
        self
    }
    pub fn max_tick_delta(mut self, seconds: f64) -> Self {
        self.max_tick_delta = Some(seconds);
        self
    }
    pub fn step_policy(mut self, policy: StepPolicy) -> Self {
        self.step_policy = Some(policy);
        self
    }
    pub fn chart_interval(mut self, seconds: f64) -> Self {
        self.chart_interval = Some(seconds);
        self
    }
    pub fn chart_window(mut self, seconds: f64) -> Self {
        self.chart_window = Some(seconds);
        self
    }
    pub fn chart_capacity(mut self, capacity: usize) -> Self {
        self.chart_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let defaults = SimulationConfig::default();

        let tissues = TissueTable {
            water: self.water.unwrap_or(defaults.ensemble.tissues.water),
            fat: self.fat.unwrap_or(defaults.ensemble.tissues.fat),
        };
        let ensemble = EnsembleSpec {
            water_count: self.water_count.unwrap_or(defaults.ensemble.water_count),
            fat_count: self.fat_count.unwrap_or(defaults.ensemble.fat_count),
            tissues,
            omega_jitter: self.omega_jitter.unwrap_or(defaults.ensemble.omega_jitter),
        };
        let pulse = PulseConfig {
            rf_duration: self.rf_duration.unwrap_or(defaults.pulse.rf_duration),
            slowmo_duration: self.slowmo_duration.unwrap_or(defaults.pulse.slowmo_duration),
            slowmo_scale: self.slowmo_scale.unwrap_or(defaults.pulse.slowmo_scale),
        };
        let field_loss = FieldLossConfig {
            retention: self.retention.unwrap_or(defaults.field_loss.retention),
            noise_scale: self.noise_scale.unwrap_or(defaults.field_loss.noise_scale),
        };
        let timing = TimingConfig {
            max_tick_delta: self.max_tick_delta.unwrap_or(defaults.timing.max_tick_delta),
            step_policy: self.step_policy.unwrap_or(defaults.timing.step_policy),
        };
        let chart = ChartConfig {
            interval: self.chart_interval.unwrap_or(defaults.chart.interval),
            window: self.chart_window.unwrap_or(defaults.chart.window),
            capacity: self.chart_capacity.unwrap_or(defaults.chart.capacity),
        };

        let config = SimulationConfig {
            ensemble,
            pulse,
            field_loss,
            timing,
            chart,
        };
        config.validate()?;
        Ok(config)
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_count("water_count", self.ensemble.water_count)?;
        require_count("fat_count", self.ensemble.fat_count)?;
        validate_tissue(
            ["water.t1", "water.t2", "water.freq"],
            &self.ensemble.tissues.water,
        )?;
        validate_tissue(["fat.t1", "fat.t2", "fat.freq"], &self.ensemble.tissues.fat)?;
        require_fraction("omega_jitter", self.ensemble.omega_jitter)?;

        require_positive("rf_duration", self.pulse.rf_duration)?;
        require_non_negative("slowmo_duration", self.pulse.slowmo_duration)?;
        if !(self.pulse.slowmo_scale > 0.0 && self.pulse.slowmo_scale <= 1.0) {
            return Err(invalid(
                "slowmo_scale",
                self.pulse.slowmo_scale,
                "must be within (0, 1]",
            ));
        }

        require_fraction("field_loss_retention", self.field_loss.retention)?;
        require_non_negative("noise_scale", self.field_loss.noise_scale)?;

        require_positive("max_tick_delta", self.timing.max_tick_delta)?;
        if let StepPolicy::SubStep { max_steps } = self.timing.step_policy {
            require_count("max_sub_steps", max_steps)?;
        }

        require_positive("chart_interval", self.chart.interval)?;
        require_positive("chart_window", self.chart.window)?;
        require_count("chart_capacity", self.chart.capacity)?;
        Ok(())
    }
}

fn invalid(name: &'static str, value: f64, requirement: &'static str) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        value,
        requirement,
    }
}

fn require_count(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(invalid(name, 0.0, "must be at least 1"));
    }
    Ok(())
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(name, value, "must be finite and positive"));
    }
    Ok(())
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(name, value, "must be finite and non-negative"));
    }
    Ok(())
}

fn require_fraction(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(invalid(name, value, "must be within [0, 1)"));
    }
    Ok(())
}

fn validate_tissue(
    [t1_name, t2_name, freq_name]: [&'static str; 3],
    properties: &TissueProperties,
) -> Result<(), ConfigError> {
    require_positive(t1_name, properties.t1)?;
    require_positive(t2_name, properties.t2)?;
    require_positive(freq_name, properties.freq)?;
    Ok(())
}
