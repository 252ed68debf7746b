use crate::cli::ContrastArgs;
use crate::error::{CliError, Result};
use spinlab::core::models::tissue::TissueTable;
use spinlab::core::physics::contrast::{
    self, CONTRAST_PRESETS, ContrastPreset, DEFAULT_TE_MS, DEFAULT_TR_MS,
};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timings {
    tr_ms: f64,
    te_ms: f64,
    preset: Option<&'static ContrastPreset>,
}

pub fn run(args: ContrastArgs) -> Result<()> {
    let timings = resolve_timings(&args)?;
    info!(
        tr_ms = timings.tr_ms,
        te_ms = timings.te_ms,
        "Computing tissue contrast."
    );
    print!("{}", render_report(&timings, &TissueTable::default()));
    Ok(())
}

fn resolve_timings(args: &ContrastArgs) -> Result<Timings> {
    let preset = match args.preset.as_deref() {
        Some(name) => Some(contrast::preset(name).ok_or_else(|| {
            let mut known: Vec<_> = CONTRAST_PRESETS.keys().copied().collect();
            known.sort_unstable();
            CliError::Argument(format!(
                "Unknown contrast preset '{}'. Expected one of: {}.",
                name,
                known.join(", ")
            ))
        })?),
        None => None,
    };

    let tr_ms = args
        .tr
        .or(preset.map(|p| p.tr_ms))
        .unwrap_or(DEFAULT_TR_MS);
    let te_ms = args
        .te
        .or(preset.map(|p| p.te_ms))
        .unwrap_or(DEFAULT_TE_MS);

    for (name, value) in [("TR", tr_ms), ("TE", te_ms)] {
        if !value.is_finite() || value < 0.0 {
            return Err(CliError::Argument(format!(
                "{} must be a non-negative number of milliseconds, got {}",
                name, value
            )));
        }
    }

    Ok(Timings {
        tr_ms,
        te_ms,
        preset,
    })
}

fn render_report(timings: &Timings, tissues: &TissueTable) -> String {
    let signals =
        contrast::tissue_signals(timings.tr_ms, timings.te_ms, &tissues.water, &tissues.fat);
    let heading = match timings.preset {
        Some(p) => format!("{}-weighted", p.label),
        None => "Custom".to_string(),
    };
    let mut out = format!(
        "{} (TR = {} ms, TE = {} ms)\n",
        heading, timings.tr_ms, timings.te_ms
    );
    out.push_str(&format!("{:<8}{:>10}{:>8}\n", "tissue", "signal", "grey"));
    for (name, signal) in [("water", signals.water), ("fat", signals.fat)] {
        out.push_str(&format!(
            "{:<8}{:>10.3}{:>8}\n",
            name,
            signal,
            contrast::grey_tone(signal)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(preset: Option<&str>, tr: Option<f64>, te: Option<f64>) -> ContrastArgs {
        ContrastArgs {
            preset: preset.map(str::to_string),
            tr,
            te,
        }
    }

    #[test]
    fn defaults_without_preset() {
        let t = resolve_timings(&args(None, None, None)).unwrap();
        assert_eq!((t.tr_ms, t.te_ms), (DEFAULT_TR_MS, DEFAULT_TE_MS));
        assert!(t.preset.is_none());
    }

    #[test]
    fn flags_override_preset() {
        let t = resolve_timings(&args(Some("T2"), None, Some(100.0))).unwrap();
        assert_eq!(t.tr_ms, 3000.0);
        assert_eq!(t.te_ms, 100.0);
        assert_eq!(t.preset.map(|p| p.label), Some("T2"));
    }

    #[test]
    fn unknown_preset_lists_known_names() {
        let err = resolve_timings(&args(Some("flair"), None, None)).unwrap_err();
        assert!(err.to_string().contains("pd, t1, t2"));
    }

    #[test]
    fn negative_timings_are_rejected() {
        assert!(resolve_timings(&args(None, Some(-1.0), None)).is_err());
    }

    #[test]
    fn report_shows_both_tissues() {
        let t = resolve_timings(&args(Some("t1"), None, None)).unwrap();
        let report = render_report(&t, &TissueTable::default());
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], "T1-weighted (TR = 500 ms, TE = 15 ms)");
        assert!(lines[2].starts_with("water"));
        assert!(lines[3].starts_with("fat"));
        assert_eq!(lines.len(), 4);
    }
}
