use super::protocol::{Protocol, ProtocolCursor};
use crate::core::models::series::{ChartSample, TraceRecord};
use crate::engine::config::SimulationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::sampler::ChartSampler;
use crate::engine::simulation::Simulation;
use crate::engine::snapshot::SimulationSnapshot;
use rand::Rng;
use tracing::{debug, info, instrument, warn};

// Upper bound on progress events per run.
const PROGRESS_UPDATES: u64 = 100;

#[derive(Debug, Clone)]
pub struct RunResult {
    pub chart: Vec<ChartSample>,
    pub trace: Vec<TraceRecord>,
    pub final_snapshot: SimulationSnapshot,
    pub ticks: u64,
    pub events_applied: usize,
}

/// Plays `protocol` against a fresh simulation built from `config`.
///
/// Time advances in frames of `frame_dt` simulated seconds. Events due at or before a
/// frame's start are posted to the controls before that frame runs; events scheduled at or
/// after the end of the protocol are never applied.
#[instrument(skip_all, name = "protocol_run")]
pub fn run<R: Rng>(
    config: &SimulationConfig,
    protocol: &Protocol,
    rng: R,
    reporter: &ProgressReporter,
) -> Result<RunResult, EngineError> {
    config.validate()?;
    protocol.validate()?;

    let total_frames = protocol.total_frames();
    reporter.report(Progress::RunStart {
        total_frames,
        duration: protocol.duration,
    });
    info!(
        duration = protocol.duration,
        frame_dt = protocol.frame_dt,
        frames = total_frames,
        events = protocol.events.len(),
        "Starting protocol run."
    );

    let mut sim = Simulation::new(*config, rng);
    let mut sampler = ChartSampler::new(config.chart, 0.0);
    let mut cursor = ProtocolCursor::new(protocol);
    let mut trace = Vec::new();
    let mut next_trace_tick = 0;
    let mut events_applied = 0;
    let mut phase = sim.phase();

    let report_every = (total_frames / PROGRESS_UPDATES).max(1);
    let mut unreported = 0;
    let mut wall = 0.0;

    for frame in 0..total_frames {
        for event in cursor.due(wall) {
            debug!(at = event.at, action = %event.action, "Applying protocol event.");
            event.action.apply(sim.controls_mut());
            reporter.report(Progress::EventApplied {
                at: event.at,
                description: event.action.to_string(),
            });
            events_applied += 1;
        }

        let next_wall = ((frame + 1) as f64 * protocol.frame_dt).min(protocol.duration);
        sim.advance(next_wall - wall);
        wall = next_wall;

        if sim.phase() != phase {
            debug!(from = %phase, to = %sim.phase(), t = wall, "Phase changed.");
            reporter.report(Progress::PhaseChanged {
                from: phase,
                to: sim.phase(),
            });
            phase = sim.phase();
        }

        if let Some(stride) = protocol.trace_stride {
            let stride = stride as u64;
            if sim.tick_count() >= next_trace_tick {
                trace.push(sim.trace_record());
                next_trace_tick = (sim.tick_count() / stride + 1) * stride;
            }
        }

        sampler.poll(&sim.aggregate().total, wall);

        unreported += 1;
        if unreported >= report_every {
            reporter.report(Progress::FramesAdvanced {
                frames: unreported,
            });
            if !reporter.is_silent() {
                reporter.report(Progress::Status {
                    text: status_line(&sim, wall),
                });
            }
            unreported = 0;
        }
    }
    if unreported > 0 {
        reporter.report(Progress::FramesAdvanced {
            frames: unreported,
        });
    }

    let skipped = cursor.remaining().len();
    if skipped > 0 {
        warn!(
            skipped,
            duration = protocol.duration,
            "Some protocol events are scheduled at or after the end of the run and were ignored."
        );
    }

    let final_snapshot = sim.snapshot();
    info!(
        ticks = final_snapshot.tick,
        samples = sampler.len(),
        trace_rows = trace.len(),
        mz = final_snapshot.aggregate.total.z,
        "Protocol run finished."
    );
    reporter.report(Progress::RunFinish);

    Ok(RunResult {
        chart: sampler.to_vec(),
        trace,
        ticks: final_snapshot.tick,
        final_snapshot,
        events_applied,
    })
}

/// One-line summary of the simulation at wall time `t`.
pub fn status_line<R: Rng>(sim: &Simulation<R>, t: f64) -> String {
    let total = sim.aggregate().total;
    format!(
        "t={:.2}s {} B0 {} Mz={:+.3} Mxy={:.3}",
        t,
        sim.phase(),
        if sim.controls().b0_on() { "on" } else { "off" },
        total.z,
        total.x.hypot(total.y)
    )
}
