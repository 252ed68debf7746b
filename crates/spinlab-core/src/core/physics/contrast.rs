use crate::core::models::tissue::TissueProperties;
use phf::{Map, phf_map};

pub const DEFAULT_TR_MS: f64 = 500.0;
pub const DEFAULT_TE_MS: f64 = 15.0;

/// A named pair of repetition and echo times that weights the image toward one mechanism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastPreset {
    pub label: &'static str,
    pub tr_ms: f64,
    pub te_ms: f64,
}

pub static CONTRAST_PRESETS: Map<&'static str, ContrastPreset> = phf_map! {
    "t1" => ContrastPreset { label: "T1", tr_ms: 500.0, te_ms: 15.0 },
    "t2" => ContrastPreset { label: "T2", tr_ms: 3000.0, te_ms: 80.0 },
    "pd" => ContrastPreset { label: "PD", tr_ms: 3000.0, te_ms: 15.0 },
};

pub fn preset(name: &str) -> Option<&'static ContrastPreset> {
    CONTRAST_PRESETS.get(name.to_ascii_lowercase().as_str())
}

#[inline]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Steady-state spin-echo signal estimate `(1 - e^(-TR/T1)) * e^(-TE/T2)`, clamped to [0, 1].
///
/// `tr_ms` and `te_ms` are in milliseconds; `t1` and `t2` in seconds.
pub fn signal(tr_ms: f64, te_ms: f64, t1: f64, t2: f64) -> f64 {
    let tr = tr_ms / 1000.0;
    let te = te_ms / 1000.0;
    let longitudinal = 1.0 - (-tr / t1).exp();
    let transverse = (-te / t2).exp();
    clamp01(longitudinal * transverse)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastSignals {
    pub water: f64,
    pub fat: f64,
}

pub fn tissue_signals(
    tr_ms: f64,
    te_ms: f64,
    water: &TissueProperties,
    fat: &TissueProperties,
) -> ContrastSignals {
    ContrastSignals {
        water: signal(tr_ms, te_ms, water.t1, water.t2),
        fat: signal(tr_ms, te_ms, fat.t1, fat.t2),
    }
}

/// Grey level (30..=240) a renderer uses to paint a tissue swatch for `signal`.
pub fn grey_tone(signal: f64) -> u8 {
    (30.0 + clamp01(signal) * 210.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::tissue::Tissue;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn signal_matches_closed_form() {
        let expected = (1.0 - (-0.5f64 / 4.0).exp()) * (-0.015f64 / 2.0).exp();
        assert!(f64_approx_equal(signal(500.0, 15.0, 4.0, 2.0), expected));
    }

    #[test]
    fn signal_is_clamped_to_unit_interval() {
        assert!(f64_approx_equal(signal(1e9, 0.0, 1.0, 1.0), 1.0));
        assert!(f64_approx_equal(signal(0.0, 15.0, 1.0, 1.0), 0.0));
    }

    #[test]
    fn t1_preset_makes_fat_brighter_than_water() {
        let p = preset("t1").unwrap();
        let signals = tissue_signals(
            p.tr_ms,
            p.te_ms,
            &Tissue::Water.default_properties(),
            &Tissue::Fat.default_properties(),
        );
        assert!(signals.fat > signals.water);
    }

    #[test]
    fn long_echo_time_penalizes_short_t2_fat_more_than_water() {
        let water = Tissue::Water.default_properties();
        let fat = Tissue::Fat.default_properties();
        let pd = preset("pd").unwrap();
        let t2 = preset("T2").unwrap();
        let short_te = tissue_signals(pd.tr_ms, pd.te_ms, &water, &fat);
        let long_te = tissue_signals(t2.tr_ms, t2.te_ms, &water, &fat);
        assert!(long_te.fat / long_te.water < short_te.fat / short_te.water);
    }

    #[test]
    fn presets_carry_documented_timings() {
        assert_eq!(preset("pd").unwrap().tr_ms, 3000.0);
        assert_eq!(preset("pd").unwrap().te_ms, 15.0);
        assert_eq!(preset("t2").unwrap().te_ms, 80.0);
        assert!(preset("flair").is_none());
    }

    #[test]
    fn grey_tone_spans_documented_range() {
        assert_eq!(grey_tone(0.0), 30);
        assert_eq!(grey_tone(1.0), 240);
        assert_eq!(grey_tone(2.0), 240);
    }
}
