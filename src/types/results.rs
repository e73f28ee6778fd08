//! Analyzer output value types.

use serde::{Deserialize, Serialize};

/// Mean power spectral density per canonical EEG frequency band.
///
/// Band edges: delta 0.5–4 Hz, theta 4–8 Hz, alpha 8–13 Hz, beta 13–30 Hz,
/// gamma 30–50 Hz. A band with no PSD bin inside its range reports 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    /// Total power across all five bands.
    pub fn total(&self) -> f64 {
        self.delta + self.theta + self.alpha + self.beta + self.gamma
    }
}

/// Band powers for one analysis window, timestamped at the window center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandPowerResult {
    /// Window center, seconds on the session timeline.
    pub timestamp: f64,
    pub bands: BandPowers,
}

/// One detected blink-like transient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlinkEvent {
    /// Peak position, seconds on the session timeline.
    pub timestamp: f64,
}

/// Signed hemispheric alpha-power ratio for one window.
///
/// `log_ratio = ln(right + ε) − ln(left + ε)` with `ε = 1e-10`; positive
/// values mean more right-hemisphere alpha power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsymmetryFrame {
    /// Window center, seconds on the session timeline.
    pub timestamp: f64,
    pub log_ratio: f64,
}

/// Classification of the session-mean alpha asymmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dominance {
    /// Session mean above +0.1.
    RightDominant,
    /// Session mean below −0.1.
    LeftDominant,
    Balanced,
}

impl Dominance {
    /// Classify a session-mean log ratio.
    pub fn classify(mean_log_ratio: f64) -> Self {
        if mean_log_ratio > 0.1 {
            Dominance::RightDominant
        } else if mean_log_ratio < -0.1 {
            Dominance::LeftDominant
        } else {
            Dominance::Balanced
        }
    }
}

impl std::fmt::Display for Dominance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dominance::RightDominant => f.write_str("right-dominant"),
            Dominance::LeftDominant => f.write_str("left-dominant"),
            Dominance::Balanced => f.write_str("balanced"),
        }
    }
}
