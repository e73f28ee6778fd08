//! Welch power spectral density estimation.

use std::f64::consts::PI;

/// A one-sided PSD estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Bin center frequencies in Hz, ascending from DC.
    pub freqs: Vec<f64>,
    /// Power density per bin, in (signal unit)²/Hz.
    pub psd: Vec<f64>,
}

/// Estimate the one-sided PSD of `signal` by Welch's method.
///
/// Segments of `nperseg` samples with 50% overlap are Hann-windowed, mean
/// detrended per segment, transformed, and the squared magnitudes averaged.
/// Density scaling is `1 / (fs · Σw²)` with non-DC, non-Nyquist bins doubled
/// to fold negative frequencies in.
///
/// A signal shorter than `nperseg` is treated as a single segment of its own
/// length. Returns an empty spectrum for a signal shorter than 2 samples.
pub fn welch(signal: &[f64], sample_rate: f64, nperseg: usize) -> Spectrum {
    let nperseg = nperseg.min(signal.len());
    if nperseg < 2 {
        return Spectrum { freqs: Vec::new(), psd: Vec::new() };
    }
    let step = (nperseg / 2).max(1);
    let n_bins = nperseg / 2 + 1;

    // Periodic Hann window
    let window: Vec<f64> =
        (0..nperseg).map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / nperseg as f64).cos()).collect();
    let win_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (sample_rate * win_power);

    let mut psd = vec![0.0; n_bins];
    let mut segments = 0usize;
    let mut start = 0usize;
    while start + nperseg <= signal.len() {
        let segment = &signal[start..start + nperseg];
        let mean = segment.iter().sum::<f64>() / nperseg as f64;
        let detrended: Vec<f64> =
            segment.iter().zip(&window).map(|(s, w)| (s - mean) * w).collect();

        for (k, bin) in psd.iter_mut().enumerate() {
            let mut re = 0.0;
            let mut im = 0.0;
            for (n, &x) in detrended.iter().enumerate() {
                let phase = -2.0 * PI * (k * n) as f64 / nperseg as f64;
                re += x * phase.cos();
                im += x * phase.sin();
            }
            *bin += re * re + im * im;
        }
        segments += 1;
        start += step;
    }
    if segments == 0 {
        return Spectrum { freqs: Vec::new(), psd: Vec::new() };
    }

    let freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * sample_rate / nperseg as f64).collect();
    for (k, bin) in psd.iter_mut().enumerate() {
        *bin *= scale / segments as f64;
        // Fold negative frequencies into all bins but DC and Nyquist
        if k != 0 && !(nperseg % 2 == 0 && k == n_bins - 1) {
            *bin *= 2.0;
        }
    }

    Spectrum { freqs, psd }
}
