//! Blink transient detection on frontal EEG.

use tracing::debug;

use crate::analysis::filter::BandPass;
use crate::types::BlinkEvent;

/// Find indices of local maxima satisfying height, spacing, and prominence
/// constraints.
///
/// Candidates at least `min_height` tall are ranked by height; a candidate
/// is kept only if no taller kept peak lies within `min_distance` samples.
/// Prominence is the drop from the peak to the higher of the two lowest
/// valleys separating it from taller terrain (or the signal edge) on each
/// side. Returned indices are ascending.
pub fn find_peaks(
    signal: &[f64],
    min_height: f64,
    min_distance: usize,
    min_prominence: f64,
) -> Vec<usize> {
    let mut candidates: Vec<usize> = Vec::new();
    for i in 1..signal.len().saturating_sub(1) {
        if signal[i] >= min_height && signal[i] > signal[i - 1] && signal[i] >= signal[i + 1] {
            candidates.push(i);
        }
    }

    candidates.retain(|&peak| prominence(signal, peak) >= min_prominence);

    // Tallest first; suppress anything too close to an already-kept peak
    candidates.sort_by(|&a, &b| signal[b].total_cmp(&signal[a]));
    let mut kept: Vec<usize> = Vec::new();
    for peak in candidates {
        if kept.iter().all(|&k| peak.abs_diff(k) >= min_distance) {
            kept.push(peak);
        }
    }
    kept.sort_unstable();
    kept
}

fn prominence(signal: &[f64], peak: usize) -> f64 {
    let height = signal[peak];

    let mut left_base = height;
    for i in (0..peak).rev() {
        if signal[i] > height {
            break;
        }
        left_base = left_base.min(signal[i]);
    }

    let mut right_base = height;
    for &s in &signal[peak + 1..] {
        if s > height {
            break;
        }
        right_base = right_base.min(s);
    }

    height - left_base.max(right_base)
}

/// Detects blink-like transients and keeps a session-cumulative count.
///
/// The input window is band-passed to 1–10 Hz with zero phase, rectified,
/// then searched for peaks at least 150 µV tall, 75 µV prominent, and 0.3 s
/// apart. Analysis windows can overlap, so a peak already reported is
/// suppressed by timestamp rather than re-counted.
#[derive(Debug)]
pub struct BlinkDetector {
    filter: BandPass,
    sample_rate: f64,
    min_height: f64,
    min_separation_secs: f64,
    min_prominence: f64,
    total: u64,
    last_timestamp: Option<f64>,
}

impl BlinkDetector {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            filter: BandPass::new(1.0, 10.0, sample_rate),
            sample_rate,
            min_height: 150.0,
            min_separation_secs: 0.3,
            min_prominence: 75.0,
            total: 0,
            last_timestamp: None,
        }
    }

    /// Scan one window of frontal EEG starting at `window_start` seconds on
    /// the session timeline. Returns newly detected blinks, oldest first.
    pub fn detect(&mut self, window: &[f64], window_start: f64) -> Vec<BlinkEvent> {
        if window.len() < 3 {
            return Vec::new();
        }
        let rectified: Vec<f64> =
            self.filter.filtfilt(window).iter().map(|s| s.abs()).collect();
        let min_distance = (self.min_separation_secs * self.sample_rate) as usize;
        let peaks = find_peaks(&rectified, self.min_height, min_distance, self.min_prominence);

        let mut events = Vec::new();
        for peak in peaks {
            let timestamp = window_start + peak as f64 / self.sample_rate;
            if let Some(last) = self.last_timestamp
                && timestamp <= last + self.min_separation_secs
            {
                continue;
            }
            self.last_timestamp = Some(timestamp);
            self.total += 1;
            debug!(timestamp, total = self.total, "blink detected");
            events.push(BlinkEvent { timestamp });
        }
        events
    }

    /// Blinks detected since the detector was created.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Mean blink rate in blinks per minute over `elapsed_secs` of session.
    pub fn rate_per_minute(&self, elapsed_secs: f64) -> f64 {
        if elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.total as f64 * 60.0 / elapsed_secs
    }
}
