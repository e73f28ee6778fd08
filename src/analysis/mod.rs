//! Windowed spectral analysis over the shared buffer bank.
//!
//! The analyzer reads buffer snapshots, never raw frames, so its cadence is
//! decoupled from notification arrival. Each pass produces at most one band
//! power result, one asymmetry frame, and any newly detected blinks, in that
//! order.

pub mod asymmetry;
pub mod bands;
pub mod blink;
pub mod filter;
pub mod psd;

use tracing::trace;

use crate::buffer::BufferBank;
use crate::types::{
    AsymmetryFrame, BandPowerResult, DeviceEvent, Dominance, EEG_SAMPLE_RATE, EegChannel,
};

pub use blink::BlinkDetector;
pub use filter::BandPass;
pub use psd::{Spectrum, welch};

/// Tuning for the per-pass analysis windows.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    /// EEG sample rate in Hz.
    pub sample_rate: f64,
    /// Window length for band power and asymmetry, seconds.
    pub band_window_secs: f64,
    /// Window length for blink detection, seconds.
    pub blink_window_secs: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { sample_rate: EEG_SAMPLE_RATE, band_window_secs: 2.0, blink_window_secs: 1.0 }
    }
}

/// Stateful spectral analyzer over one session's buffers.
///
/// Band powers come from the TP9 electrode, blinks from the averaged
/// frontal pair (AF7, AF8), asymmetry from the temporal pair (TP9 left,
/// TP10 right). A computation whose window is not yet fully written is
/// skipped for that pass and retried on the next one.
///
/// All timestamps derive from each buffer's lifetime write count divided by
/// the sample rate, so identical input produces identical output.
#[derive(Debug)]
pub struct Analyzer {
    config: AnalysisConfig,
    blinks: BlinkDetector,
    asym_sum: f64,
    asym_count: u64,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            blinks: BlinkDetector::new(config.sample_rate),
            config,
            asym_sum: 0.0,
            asym_count: 0,
        }
    }

    /// Run one analysis pass over current buffer contents.
    pub fn analyze(&mut self, bank: &BufferBank) -> Vec<DeviceEvent> {
        let mut events = Vec::new();

        if let Some(result) = self.band_power_pass(bank) {
            events.push(DeviceEvent::BandPower(result));
        }
        for blink in self.blink_pass(bank) {
            events.push(DeviceEvent::Blink(blink));
        }
        if let Some(frame) = self.asymmetry_pass(bank) {
            events.push(DeviceEvent::Asymmetry(frame));
        }
        events
    }

    fn band_power_pass(&self, bank: &BufferBank) -> Option<BandPowerResult> {
        let window = (self.config.band_window_secs * self.config.sample_rate) as usize;
        let (samples, end_time) = self.window(bank, EegChannel::Tp9, window)?;
        let spectrum = welch(&samples, self.config.sample_rate, window / 2);
        Some(BandPowerResult {
            timestamp: end_time - self.config.band_window_secs / 2.0,
            bands: bands::band_powers(&spectrum),
        })
    }

    fn blink_pass(&mut self, bank: &BufferBank) -> Vec<crate::types::BlinkEvent> {
        let window = (self.config.blink_window_secs * self.config.sample_rate) as usize;
        let Some((af7, end_time)) = self.window(bank, EegChannel::Af7, window) else {
            return Vec::new();
        };
        let Some((af8, _)) = self.window(bank, EegChannel::Af8, window) else {
            return Vec::new();
        };
        let frontal: Vec<f64> =
            af7.iter().zip(&af8).map(|(a, b)| (a + b) / 2.0).collect();
        self.blinks.detect(&frontal, end_time - self.config.blink_window_secs)
    }

    fn asymmetry_pass(&mut self, bank: &BufferBank) -> Option<AsymmetryFrame> {
        let window = (self.config.band_window_secs * self.config.sample_rate) as usize;
        let (left, end_time) = self.window(bank, EegChannel::Tp9, window)?;
        let (right, _) = self.window(bank, EegChannel::Tp10, window)?;

        let log_ratio = asymmetry::window_asymmetry(&left, &right, self.config.sample_rate)?;
        self.asym_sum += log_ratio;
        self.asym_count += 1;
        trace!(log_ratio, "asymmetry window");
        Some(AsymmetryFrame {
            timestamp: end_time - self.config.band_window_secs / 2.0,
            log_ratio,
        })
    }

    /// The trailing `window` samples of one channel plus the timestamp of
    /// the window's end, or `None` until that many samples exist.
    fn window(
        &self,
        bank: &BufferBank,
        channel: EegChannel,
        window: usize,
    ) -> Option<(Vec<f64>, f64)> {
        let (ordered, written) = bank.snapshot_eeg(channel)?;
        if written < window as u64 || ordered.len() < window {
            return None;
        }
        let samples = ordered[ordered.len() - window..].to_vec();
        let end_time = written as f64 / self.config.sample_rate;
        Some((samples, end_time))
    }

    /// Running mean of all asymmetry windows this session.
    pub fn mean_asymmetry(&self) -> Option<f64> {
        (self.asym_count > 0).then(|| self.asym_sum / self.asym_count as f64)
    }

    /// Hemisphere dominance over the session so far.
    pub fn dominance(&self) -> Dominance {
        match self.mean_asymmetry() {
            Some(mean) => Dominance::classify(mean),
            None => Dominance::Balanced,
        }
    }

    /// Total blinks detected this session.
    pub fn blink_total(&self) -> u64 {
        self.blinks.total()
    }

    /// Mean blink rate in blinks per minute over `elapsed_secs` of session.
    pub fn blink_rate(&self, elapsed_secs: f64) -> f64 {
        self.blinks.rate_per_minute(elapsed_secs)
    }
}
