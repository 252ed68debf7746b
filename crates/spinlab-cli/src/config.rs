use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use serde::Deserialize;
use spinlab::core::models::tissue::TissueProperties;
use spinlab::engine::config::{self as core_config, StepPolicy};
use spinlab::workflows::protocol::{Action, Protocol};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_DURATION: f64 = 10.0;
pub const DEFAULT_FRAME_DT: f64 = 1.0 / 60.0;
pub const DEFAULT_MAX_SUB_STEPS: usize = 16;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSimulationConfig {
    water_count: Option<usize>,
    fat_count: Option<usize>,
    rf_pulse_duration: Option<f64>,
    slowmo_duration: Option<f64>,
    slowmo_scale: Option<f64>,
    noise_scale: Option<f64>,
    max_tick_delta: Option<f64>,
    seed: Option<u64>,
    sub_step: Option<bool>,
    max_sub_steps: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialTissueConfig {
    t1: Option<f64>,
    t2: Option<f64>,
    freq: Option<f64>,
}

impl PartialTissueConfig {
    fn resolve(&self, defaults: TissueProperties) -> TissueProperties {
        TissueProperties {
            t1: self.t1.unwrap_or(defaults.t1),
            t2: self.t2.unwrap_or(defaults.t2),
            freq: self.freq.unwrap_or(defaults.freq),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialTissuesConfig {
    water: Option<PartialTissueConfig>,
    fat: Option<PartialTissueConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialChartConfig {
    interval: Option<f64>,
    window: Option<f64>,
    capacity: Option<usize>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialEvent {
    at: f64,
    action: String,
    angle: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialProtocolConfig {
    duration: Option<f64>,
    frame_dt: Option<f64>,
    trace_stride: Option<usize>,
    #[serde(default)]
    events: Vec<PartialEvent>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSpinlabConfig {
    simulation: Option<PartialSimulationConfig>,
    tissues: Option<PartialTissuesConfig>,
    chart: Option<PartialChartConfig>,
    protocol: Option<PartialProtocolConfig>,
}

/// Fully resolved settings for one `run` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub simulation: core_config::SimulationConfig,
    pub protocol: Protocol,
    pub seed: Option<u64>,
}

impl PartialSpinlabConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Resolves the final configuration. Precedence, highest first: dedicated CLI flags,
    /// `--set` overrides, the config file, built-in defaults.
    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;

        let sim_file = self.simulation.take().unwrap_or_default();
        let tissues_file = self.tissues.take().unwrap_or_default();
        let chart_file = self.chart.take().unwrap_or_default();
        let protocol_file = self.protocol.take().unwrap_or_default();

        let defaults = core_config::SimulationConfig::default();
        let water = tissues_file
            .water
            .unwrap_or_default()
            .resolve(defaults.ensemble.tissues.water);
        let fat = tissues_file
            .fat
            .unwrap_or_default()
            .resolve(defaults.ensemble.tissues.fat);

        let sub_step = args.sub_step || sim_file.sub_step.unwrap_or(false);
        let step_policy = if sub_step {
            StepPolicy::SubStep {
                max_steps: sim_file.max_sub_steps.unwrap_or(DEFAULT_MAX_SUB_STEPS),
            }
        } else {
            StepPolicy::Clamp
        };

        let mut builder = core_config::SimulationConfigBuilder::new()
            .water(water)
            .fat(fat)
            .step_policy(step_policy);
        if let Some(v) = sim_file.water_count {
            builder = builder.water_count(v);
        }
        if let Some(v) = sim_file.fat_count {
            builder = builder.fat_count(v);
        }
        if let Some(v) = sim_file.rf_pulse_duration {
            builder = builder.rf_duration(v);
        }
        if let Some(v) = sim_file.slowmo_duration {
            builder = builder.slowmo_duration(v);
        }
        if let Some(v) = sim_file.slowmo_scale {
            builder = builder.slowmo_scale(v);
        }
        if let Some(v) = sim_file.noise_scale {
            builder = builder.noise_scale(v);
        }
        if let Some(v) = sim_file.max_tick_delta {
            builder = builder.max_tick_delta(v);
        }
        if let Some(v) = chart_file.interval {
            builder = builder.chart_interval(v);
        }
        if let Some(v) = chart_file.window {
            builder = builder.chart_window(v);
        }
        if let Some(v) = chart_file.capacity {
            builder = builder.chart_capacity(v);
        }
        let simulation = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let protocol = Self::merge_protocol(protocol_file, args)?;

        Ok(AppConfig {
            simulation,
            protocol,
            seed: args.seed.or(sim_file.seed),
        })
    }

    fn merge_protocol(file: PartialProtocolConfig, args: &RunArgs) -> Result<Protocol> {
        let duration = args
            .duration
            .or(file.duration)
            .unwrap_or(DEFAULT_DURATION);
        let frame_dt = args
            .frame_dt
            .or(file.frame_dt)
            .unwrap_or(DEFAULT_FRAME_DT);
        let mut protocol = Protocol::new(duration, frame_dt);

        protocol.trace_stride = args
            .trace_stride
            .or(file.trace_stride)
            .or(args.trace_out.as_ref().map(|_| 1));

        for event in file.events {
            let action = Action::from_name(&event.action, event.angle)?;
            protocol = protocol.with_event(event.at, action);
        }
        for &(at, angle) in &args.pulses {
            protocol = protocol.with_event(at, Action::Pulse { angle });
        }
        for &at in &args.field_off {
            protocol = protocol.with_event(at, Action::FieldOff);
        }
        for &at in &args.field_on {
            protocol = protocol.with_event(at, Action::FieldOn);
        }
        for &at in &args.resets {
            protocol = protocol.with_event(at, Action::Reset);
        }

        protocol.validate()?;
        Ok(protocol)
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let key = key.trim();
            let value_str = value_str.trim();

            match key {
                "simulation.water-count" => {
                    self.simulation.get_or_insert_with(Default::default).water_count =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.fat-count" => {
                    self.simulation.get_or_insert_with(Default::default).fat_count =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.rf-pulse-duration" => {
                    self.simulation.get_or_insert_with(Default::default).rf_pulse_duration =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.slowmo-duration" => {
                    self.simulation.get_or_insert_with(Default::default).slowmo_duration =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.slowmo-scale" => {
                    self.simulation.get_or_insert_with(Default::default).slowmo_scale =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.noise-scale" => {
                    self.simulation.get_or_insert_with(Default::default).noise_scale =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.max-tick-delta" => {
                    self.simulation.get_or_insert_with(Default::default).max_tick_delta =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.sub-step" => {
                    self.simulation.get_or_insert_with(Default::default).sub_step =
                        Some(parse_value(key, value_str)?);
                }
                "simulation.max-sub-steps" => {
                    self.simulation.get_or_insert_with(Default::default).max_sub_steps =
                        Some(parse_value(key, value_str)?);
                }
                "chart.interval" => {
                    self.chart.get_or_insert_with(Default::default).interval =
                        Some(parse_value(key, value_str)?);
                }
                "chart.window" => {
                    self.chart.get_or_insert_with(Default::default).window =
                        Some(parse_value(key, value_str)?);
                }
                "chart.capacity" => {
                    self.chart.get_or_insert_with(Default::default).capacity =
                        Some(parse_value(key, value_str)?);
                }
                "protocol.duration" => {
                    self.protocol.get_or_insert_with(Default::default).duration =
                        Some(parse_value(key, value_str)?);
                }
                "protocol.frame-dt" => {
                    self.protocol.get_or_insert_with(Default::default).frame_dt =
                        Some(parse_value(key, value_str)?);
                }
                "protocol.trace-stride" => {
                    self.protocol.get_or_insert_with(Default::default).trace_stride =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    if let Some(rest) = key.strip_prefix("tissues.") {
                        self.set_tissue_value(key, rest, value_str)?;
                    } else {
                        return Err(CliError::Config(format!(
                            "Unsupported configuration key for --set: '{}'",
                            key
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn set_tissue_value(&mut self, key: &str, rest: &str, value_str: &str) -> Result<()> {
        let tissues = self.tissues.get_or_insert_with(Default::default);
        let (tissue, field) = rest.split_once('.').unwrap_or((rest, ""));
        let slot = match tissue {
            "water" => tissues.water.get_or_insert_with(Default::default),
            "fat" => tissues.fat.get_or_insert_with(Default::default),
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        };
        let value = Some(parse_value(key, value_str)?);
        match field {
            "t1" => slot.t1 = value,
            "t2" => slot.t2 = value,
            "freq" => slot.freq = value,
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid value for {}: {}", key, value_str))
    })
}
