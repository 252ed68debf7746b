use crate::core::physics::constants::{
    FAT_FREQ, FAT_T1, FAT_T2, WATER_FREQ, WATER_T1, WATER_T2, angular_frequency,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The two proton populations modelled by the ensemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tissue {
    /// Free water: long T1, long T2, reference resonance frequency.
    Water,
    /// Fat: short T1, short T2, resonates slightly below water (chemical shift).
    Fat,
}

/// Relaxation and resonance constants shared by every spin of one tissue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TissueProperties {
    /// Longitudinal relaxation time constant in seconds.
    pub t1: f64,
    /// Transverse relaxation time constant in seconds.
    pub t2: f64,
    /// Nominal precession frequency in relative units (cycles per second).
    pub freq: f64,
}

impl TissueProperties {
    /// Nominal angular frequency `2π·freq` in radians per second.
    pub fn nominal_omega(&self) -> f64 {
        angular_frequency(self.freq)
    }
}

impl Tissue {
    pub const ALL: [Tissue; 2] = [Tissue::Water, Tissue::Fat];

    pub fn default_properties(self) -> TissueProperties {
        match self {
            Tissue::Water => TissueProperties {
                t1: WATER_T1,
                t2: WATER_T2,
                freq: WATER_FREQ,
            },
            Tissue::Fat => TissueProperties {
                t1: FAT_T1,
                t2: FAT_T2,
                freq: FAT_FREQ,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tissue::Water => "water",
            Tissue::Fat => "fat",
        }
    }
}

impl fmt::Display for Tissue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown tissue '{0}'. Expected 'water' or 'fat'.")]
pub struct ParseTissueError(pub String);

impl FromStr for Tissue {
    type Err = ParseTissueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "water" => Ok(Tissue::Water),
            "fat" => Ok(Tissue::Fat),
            _ => Err(ParseTissueError(s.to_string())),
        }
    }
}

/// Per-tissue constants for the whole simulation, overridable from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TissueTable {
    pub water: TissueProperties,
    pub fat: TissueProperties,
}

impl TissueTable {
    pub fn get(&self, tissue: Tissue) -> &TissueProperties {
        match tissue {
            Tissue::Water => &self.water,
            Tissue::Fat => &self.fat,
        }
    }

    /// Mean of the two nominal frequencies; the rotating reference frame turns at this rate.
    pub fn average_freq(&self) -> f64 {
        (self.water.freq + self.fat.freq) / 2.0
    }
}

impl Default for TissueTable {
    fn default() -> Self {
        Self {
            water: Tissue::Water.default_properties(),
            fat: Tissue::Fat.default_properties(),
        }
    }
}

/// Which tissue populations a display layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TissueMode {
    Water,
    Fat,
    #[default]
    Both,
}

impl TissueMode {
    pub fn shows(self, tissue: Tissue) -> bool {
        match self {
            TissueMode::Both => true,
            TissueMode::Water => tissue == Tissue::Water,
            TissueMode::Fat => tissue == Tissue::Fat,
        }
    }
}

impl FromStr for TissueMode {
    type Err = ParseTissueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "both" => Ok(TissueMode::Both),
            other => other.parse::<Tissue>().map(|t| match t {
                Tissue::Water => TissueMode::Water,
                Tissue::Fat => TissueMode::Fat,
            }),
        }
    }
}
