use crate::cli::RunArgs;
use crate::config::{AppConfig, PartialSpinlabConfig};
use crate::error::{CliError, Result};
use crate::ui::{CliProgressHandler, UiEvent};
use nalgebra::Vector3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use spinlab::core::io::csv_export::write_records_to_path;
use spinlab::core::models::tissue::TissueMode;
use spinlab::engine::progress::{Progress, ProgressReporter};
use spinlab::engine::sampler::ChartSampler;
use spinlab::engine::simulation::Simulation;
use spinlab::engine::snapshot::{SimulationSnapshot, SnapshotBuffer};
use spinlab::workflows::protocol::ProtocolCursor;
use spinlab::workflows::run::{self as protocol_run, RunResult, status_line};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const STATUS_INTERVAL: Duration = Duration::from_millis(250);
const MIN_TIMER_PERIOD: Duration = Duration::from_millis(1);

pub async fn run(args: RunArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let partial = match &args.config {
        Some(path) => PartialSpinlabConfig::from_file(path)?,
        None => PartialSpinlabConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let app = partial.merge_with_cli(&args)?;

    let rng = match app.seed {
        Some(seed) => {
            info!(seed, "Seeding random source.");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::with_callback(handler.get_callback());

    let result = if args.realtime {
        info!("Running in real time.");
        run_realtime(&app, rng, &reporter).await?
    } else {
        info!("Invoking the protocol workflow...");
        tokio::task::block_in_place(|| {
            protocol_run::run(&app.simulation, &app.protocol, rng, &reporter)
        })?
    };

    info!(
        ticks = result.ticks,
        events = result.events_applied,
        samples = result.chart.len(),
        "Run finished."
    );

    export_series(&args, &result)?;

    let rotating_freq = args
        .rotating_frame
        .then(|| app.simulation.ensemble.tissues.average_freq());
    print!(
        "{}",
        summarize(&result.final_snapshot, args.show, rotating_freq)
    );
    Ok(())
}

/// Plays the protocol against the wall clock: a frame timer drives the simulation, a
/// second timer samples the chart from published snapshots, and a third posts status.
async fn run_realtime(
    app: &AppConfig,
    rng: StdRng,
    reporter: &ProgressReporter<'_>,
) -> Result<RunResult> {
    let protocol = &app.protocol;
    let mut sim = Simulation::new(app.simulation, rng);
    let buffer = SnapshotBuffer::new(sim.snapshot());
    let mut sampler = ChartSampler::new(app.simulation.chart, 0.0);
    let mut cursor = ProtocolCursor::new(protocol);
    let mut trace = Vec::new();
    let mut next_trace_tick = 0;
    let mut events_applied = 0;
    let mut phase = sim.phase();

    reporter.report(Progress::RunStart {
        total_frames: protocol.total_frames(),
        duration: protocol.duration,
    });

    let frame_period = Duration::from_secs_f64(protocol.frame_dt).max(MIN_TIMER_PERIOD);
    let chart_period =
        Duration::from_secs_f64(app.simulation.chart.interval).max(MIN_TIMER_PERIOD);

    let start = Instant::now();
    let mut last = start;
    let mut frames = time::interval(frame_period);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut chart = time::interval_at(start + chart_period, chart_period);
    chart.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut status = time::interval(STATUS_INTERVAL);
    let deadline = time::sleep(Duration::from_secs_f64(protocol.duration));
    tokio::pin!(deadline);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut ctrl_c => {
                warn!("Interrupted, stopping the run early.");
                break;
            }
            now = frames.tick() => {
                let wall = now.duration_since(start).as_secs_f64();
                for event in cursor.due(wall) {
                    debug!(at = event.at, action = %event.action, "Applying protocol event.");
                    event.action.apply(sim.controls_mut());
                    reporter.report(Progress::EventApplied {
                        at: event.at,
                        description: event.action.to_string(),
                    });
                    events_applied += 1;
                }

                sim.advance(now.duration_since(last).as_secs_f64());
                last = now;

                if sim.phase() != phase {
                    reporter.report(Progress::PhaseChanged { from: phase, to: sim.phase() });
                    phase = sim.phase();
                }
                if let Some(stride) = protocol.trace_stride {
                    let stride = stride as u64;
                    if sim.tick_count() >= next_trace_tick {
                        trace.push(sim.trace_record());
                        next_trace_tick = (sim.tick_count() / stride + 1) * stride;
                    }
                }
                buffer.publish(sim.snapshot());
                reporter.report(Progress::FramesAdvanced { frames: 1 });
            }
            now = chart.tick() => {
                let wall = now.duration_since(start).as_secs_f64();
                let latest = buffer.latest();
                sampler.sample(&latest.aggregate.total, wall);
            }
            _ = status.tick() => {
                reporter.report(Progress::Status {
                    text: status_line(&sim, start.elapsed().as_secs_f64()),
                });
            }
        }
    }

    if !cursor.is_finished() {
        warn!(
            skipped = cursor.remaining().len(),
            "Some protocol events were not reached before the run ended."
        );
    }
    reporter.report(Progress::RunFinish);

    let final_snapshot = sim.snapshot();
    Ok(RunResult {
        chart: sampler.to_vec(),
        trace,
        ticks: final_snapshot.tick,
        final_snapshot,
        events_applied,
    })
}

fn export_series(args: &RunArgs, result: &RunResult) -> Result<()> {
    if let Some(path) = &args.chart_out {
        write_csv(&result.chart, path)?;
        println!(
            "Chart series ({} samples) written to: {}",
            result.chart.len(),
            path.display()
        );
    }
    if let Some(path) = &args.trace_out {
        write_csv(&result.trace, path)?;
        println!(
            "Trace ({} rows) written to: {}",
            result.trace.len(),
            path.display()
        );
    }
    Ok(())
}

fn write_csv<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    info!("Writing {} record(s) to {:?}", records.len(), path);
    write_records_to_path(records, path).map_err(|source| CliError::Export {
        path: path.to_path_buf(),
        source,
    })
}

fn summarize(
    snapshot: &SimulationSnapshot,
    mode: TissueMode,
    rotating_freq: Option<f64>,
) -> String {
    let (view, frame) = match rotating_freq {
        Some(freq) => (snapshot.in_rotating_frame(freq), "rotating"),
        None => (snapshot.clone(), "lab"),
    };
    let mut out = format!(
        "Final state after {} ticks ({:.2}s, {} frame): {}, B0 {}\n",
        view.tick,
        view.elapsed,
        frame,
        view.phase,
        if view.b0_on { "on" } else { "off" }
    );
    out.push_str(&vector_line("total", &view.aggregate.total));
    for (tissue, vector) in view.aggregate.visible(mode) {
        out.push_str(&vector_line(tissue.as_str(), &vector));
    }
    out
}

fn vector_line(label: &str, v: &Vector3<f64>) -> String {
    format!(
        "  {:<6} M = ({:+.3}, {:+.3}, {:+.3})  |Mxy| = {:.3}\n",
        label,
        v.x,
        v.y,
        v.z,
        v.x.hypot(v.y)
    )
}
