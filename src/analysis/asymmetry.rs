//! Hemispheric alpha asymmetry.

use crate::analysis::bands::{ALPHA, band_power};
use crate::analysis::psd::welch;
use crate::types::AsymmetryFrame;

/// Floor keeping the log defined when a hemisphere reports zero alpha.
const EPSILON: f64 = 1e-10;

/// Signed log ratio of right- to left-hemisphere alpha power.
///
/// Positive values mean more right alpha; [`Dominance::classify`] maps the
/// session mean to a label.
///
/// [`Dominance::classify`]: crate::types::Dominance::classify
pub fn log_alpha_ratio(left_alpha: f64, right_alpha: f64) -> f64 {
    (right_alpha + EPSILON).ln() - (left_alpha + EPSILON).ln()
}

/// Alpha asymmetry over one paired window of temporal-electrode EEG.
///
/// Both slices must cover the same time span; the shorter length is used
/// for both. Returns `None` when under two samples remain.
pub fn window_asymmetry(left: &[f64], right: &[f64], sample_rate: f64) -> Option<f64> {
    let n = left.len().min(right.len());
    if n < 2 {
        return None;
    }
    let nperseg = n / 2;
    let left_alpha = band_power(&welch(&left[..n], sample_rate, nperseg), ALPHA);
    let right_alpha = band_power(&welch(&right[..n], sample_rate, nperseg), ALPHA);
    Some(log_alpha_ratio(left_alpha, right_alpha))
}

/// Offline asymmetry series over a full recording, 2 s windows advancing by
/// half a window, each stamped at its window center.
pub fn asymmetry_series(
    left: &[f64],
    right: &[f64],
    sample_rate: f64,
    start_secs: f64,
) -> Vec<AsymmetryFrame> {
    let n = left.len().min(right.len());
    let window = (2.0 * sample_rate) as usize;
    let step = window / 2;
    if n < window || window == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut start = 0usize;
    while start + window <= n {
        if let Some(log_ratio) =
            window_asymmetry(&left[start..start + window], &right[start..start + window], sample_rate)
        {
            let timestamp = start_secs + (start + window / 2) as f64 / sample_rate;
            out.push(AsymmetryFrame { timestamp, log_ratio });
        }
        start += step;
    }
    out
}
