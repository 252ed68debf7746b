use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use spinlab::core::models::tissue::TissueMode;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Spinlab Developers",
    version,
    about = "Spinlab CLI - Run and inspect the water/fat spin-ensemble simulation headlessly or in real time.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the spin ensemble through a timed protocol of pulses, field switches and resets.
    Run(RunArgs),
    /// Print the spin-echo contrast of water and fat for a TR/TE pair or a named preset.
    Contrast(ContrastArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Protocol ---
    /// Simulated duration of the run in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,

    /// Length of one frame in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub frame_dt: Option<f64>,

    /// Play an RF pulse of ANGLE degrees at time AT. Can be used multiple times.
    #[arg(long = "pulse", value_name = "AT:ANGLE", value_parser = parser::parse_pulse)]
    pub pulses: Vec<(f64, f64)>,

    /// Switch the main field off at the given time. Can be used multiple times.
    #[arg(long = "field-off", value_name = "AT", value_parser = parser::parse_time)]
    pub field_off: Vec<f64>,

    /// Switch the main field on at the given time. Can be used multiple times.
    #[arg(long = "field-on", value_name = "AT", value_parser = parser::parse_time)]
    pub field_on: Vec<f64>,

    /// Reset the ensemble to equilibrium at the given time. Can be used multiple times.
    #[arg(long = "reset", value_name = "AT", value_parser = parser::parse_time)]
    pub resets: Vec<f64>,

    // --- Simulation ---
    /// Seed for the random source, making the run reproducible.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Split long frames into several ticks instead of clamping them.
    #[arg(long)]
    pub sub_step: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S tissues.fat.t2=0.3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,

    // --- Output ---
    /// Write the chart series (time, mz, mxy) as CSV.
    #[arg(long, value_name = "PATH")]
    pub chart_out: Option<PathBuf>,

    /// Write the per-tick aggregate trace as CSV.
    #[arg(long, value_name = "PATH")]
    pub trace_out: Option<PathBuf>,

    /// Record a trace row every N ticks (implied as 1 by --trace-out).
    #[arg(long, value_name = "INT")]
    pub trace_stride: Option<usize>,

    /// Tissue populations included in the final summary.
    #[arg(long, value_name = "water|fat|both", default_value = "both")]
    pub show: TissueMode,

    /// Report the final net vectors in the frame rotating at the mean tissue frequency.
    #[arg(long)]
    pub rotating_frame: bool,

    /// Pace the run against the wall clock instead of running as fast as possible.
    #[arg(long)]
    pub realtime: bool,
}

/// Arguments for the `contrast` subcommand.
#[derive(Args, Debug, Default)]
pub struct ContrastArgs {
    /// Named weighting: t1, t2 or pd.
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Repetition time in milliseconds, overriding the preset.
    #[arg(long, value_name = "MS")]
    pub tr: Option<f64>,

    /// Echo time in milliseconds, overriding the preset.
    #[arg(long, value_name = "MS")]
    pub te: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_arguments_parse() {
        let cli = Cli::parse_from([
            "spinlab",
            "-vv",
            "run",
            "--duration",
            "3",
            "--pulse",
            "0.5:90",
            "--pulse",
            "2:180",
            "--field-off",
            "1.5",
            "--seed",
            "7",
            "-S",
            "chart.capacity=50",
            "--show",
            "fat",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command else {
            panic!("Expected 'run' subcommand");
        };
        assert_eq!(args.duration, Some(3.0));
        assert_eq!(args.pulses, vec![(0.5, 90.0), (2.0, 180.0)]);
        assert_eq!(args.field_off, vec![1.5]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.set_values, vec!["chart.capacity=50".to_string()]);
        assert_eq!(args.show, TissueMode::Fat);
        assert!(!args.realtime);
    }

    #[test]
    fn malformed_pulse_is_rejected() {
        let result = Cli::try_parse_from(["spinlab", "run", "--pulse", "90"]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["spinlab", "-q", "-v", "contrast"]);
        assert!(result.is_err());
    }

    #[test]
    fn contrast_arguments_parse() {
        let cli = Cli::parse_from(["spinlab", "contrast", "--preset", "t2", "--te", "100"]);
        let Commands::Contrast(args) = cli.command else {
            panic!("Expected 'contrast' subcommand");
        };
        assert_eq!(args.preset.as_deref(), Some("t2"));
        assert_eq!(args.te, Some(100.0));
        assert_eq!(args.tr, None);
    }
}
