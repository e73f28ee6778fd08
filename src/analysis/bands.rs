//! Canonical EEG band aggregation.

use crate::analysis::psd::{Spectrum, welch};
use crate::types::{BandPowerResult, BandPowers};

/// `(low, high)` band edges in Hz, both ends inclusive.
pub const DELTA: (f64, f64) = (0.5, 4.0);
pub const THETA: (f64, f64) = (4.0, 8.0);
pub const ALPHA: (f64, f64) = (8.0, 13.0);
pub const BETA: (f64, f64) = (13.0, 30.0);
pub const GAMMA: (f64, f64) = (30.0, 50.0);

/// Mean PSD over the bins falling inside one band, 0 when no bin does.
pub fn band_power(spectrum: &Spectrum, band: (f64, f64)) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for (f, p) in spectrum.freqs.iter().zip(&spectrum.psd) {
        if *f >= band.0 && *f <= band.1 {
            sum += p;
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Aggregate a spectrum into the five canonical bands.
pub fn band_powers(spectrum: &Spectrum) -> BandPowers {
    BandPowers {
        delta: band_power(spectrum, DELTA),
        theta: band_power(spectrum, THETA),
        alpha: band_power(spectrum, ALPHA),
        beta: band_power(spectrum, BETA),
        gamma: band_power(spectrum, GAMMA),
    }
}

/// Offline sliding band-power series over a full recording.
///
/// Two-second windows advance by half a window; each result is stamped at
/// its window center relative to `start_secs`. Trailing samples short of a
/// full window are dropped.
pub fn band_power_series(
    signal: &[f64],
    sample_rate: f64,
    start_secs: f64,
) -> Vec<BandPowerResult> {
    let window = (2.0 * sample_rate) as usize;
    let step = window / 2;
    if signal.len() < window || window == 0 {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut start = 0usize;
    while start + window <= signal.len() {
        let spectrum = welch(&signal[start..start + window], sample_rate, window / 2);
        let center = start_secs + (start + window / 2) as f64 / sample_rate;
        out.push(BandPowerResult { timestamp: center, bands: band_powers(&spectrum) });
        start += step;
    }
    out
}
