//! Fixed-capacity sample history with NaN fill.
//!
//! One [`RingBuffer`] per buffered channel, grouped into a [`BufferBank`]
//! shared between the session task (writer) and the analysis task (reader).
//! Unwritten positions hold NaN so a reader can tell "no data yet" from a
//! real zero sample, and so windowed math naturally excludes the warm-up
//! region.

use std::sync::Mutex;

use crate::types::{EEG_SAMPLE_RATE, EegChannel, MOTION_SAMPLE_RATE, MotionSensor};

/// Circular overwrite buffer of `f64` samples, initialized to NaN.
#[derive(Debug)]
pub struct RingBuffer {
    buf: Vec<f64>,
    cursor: usize,
    total_written: u64,
}

impl RingBuffer {
    /// Create a buffer holding `capacity` samples, all NaN.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be nonzero");
        Self { buf: vec![f64::NAN; capacity], cursor: 0, total_written: 0 }
    }

    /// Append samples in order, overwriting the oldest once full.
    ///
    /// A chunk at least as long as the buffer replaces the whole contents
    /// with its newest `capacity()` samples.
    pub fn extend(&mut self, samples: &[f64]) {
        let capacity = self.buf.len();
        if samples.len() >= capacity {
            self.buf.copy_from_slice(&samples[samples.len() - capacity..]);
            self.cursor = 0;
        } else {
            for &s in samples {
                self.buf[self.cursor] = s;
                self.cursor = (self.cursor + 1) % capacity;
            }
        }
        self.total_written += samples.len() as u64;
    }

    /// Full-capacity snapshot in chronological order, oldest first.
    ///
    /// Always returns exactly `capacity()` values; positions never written
    /// are NaN and sort to the front until the buffer wraps.
    pub fn ordered(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.buf.len());
        out.extend_from_slice(&self.buf[self.cursor..]);
        out.extend_from_slice(&self.buf[..self.cursor]);
        out
    }

    /// Trailing non-NaN samples in chronological order.
    pub fn filled(&self) -> Vec<f64> {
        let mut out = self.ordered();
        let start = out.iter().position(|s| !s.is_nan()).unwrap_or(out.len());
        out.drain(..start);
        out
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Count of samples written over the buffer's lifetime, including
    /// samples already overwritten.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }
}

/// Shared sample history for all buffered channels.
///
/// Writers and readers lock individual channel buffers, never the bank, so
/// the session task and the analysis task only contend per channel.
#[derive(Debug)]
pub struct BufferBank {
    eeg: [Mutex<RingBuffer>; 4],
    accel: [Mutex<RingBuffer>; 3],
    gyro: [Mutex<RingBuffer>; 3],
}

impl BufferBank {
    /// Create a bank sized for `eeg_secs` of EEG and `motion_secs` of
    /// motion history per channel.
    pub fn new(eeg_secs: f64, motion_secs: f64) -> Self {
        let eeg_cap = (EEG_SAMPLE_RATE * eeg_secs) as usize;
        let motion_cap = (MOTION_SAMPLE_RATE * motion_secs) as usize;
        Self {
            eeg: std::array::from_fn(|_| Mutex::new(RingBuffer::new(eeg_cap))),
            accel: std::array::from_fn(|_| Mutex::new(RingBuffer::new(motion_cap))),
            gyro: std::array::from_fn(|_| Mutex::new(RingBuffer::new(motion_cap))),
        }
    }

    /// Append EEG samples for one channel. Auxiliary channels have no
    /// buffer and are ignored.
    pub fn extend_eeg(&self, channel: EegChannel, samples: &[f64]) {
        if let Some(idx) = channel.buffer_index() {
            self.eeg[idx].lock().unwrap().extend(samples);
        }
    }

    /// Append motion triples, one ring per axis.
    pub fn extend_motion(&self, sensor: MotionSensor, triples: &[[f64; 3]]) {
        let bank = match sensor {
            MotionSensor::Accel => &self.accel,
            MotionSensor::Gyro => &self.gyro,
        };
        for axis in 0..3 {
            let samples: Vec<f64> = triples.iter().map(|t| t[axis]).collect();
            bank[axis].lock().unwrap().extend(&samples);
        }
    }

    /// Chronological snapshot of one EEG channel plus its lifetime write
    /// count, taken under a single lock so the pair is consistent.
    pub fn snapshot_eeg(&self, channel: EegChannel) -> Option<(Vec<f64>, u64)> {
        let idx = channel.buffer_index()?;
        let buf = self.eeg[idx].lock().unwrap();
        Some((buf.ordered(), buf.total_written()))
    }

    /// Chronological snapshot of one motion axis (0 = x, 1 = y, 2 = z).
    pub fn snapshot_motion(&self, sensor: MotionSensor, axis: usize) -> (Vec<f64>, u64) {
        let bank = match sensor {
            MotionSensor::Accel => &self.accel,
            MotionSensor::Gyro => &self.gyro,
        };
        let buf = bank[axis].lock().unwrap();
        (buf.ordered(), buf.total_written())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn starts_all_nan() {
        let buf = RingBuffer::new(8);
        assert_eq!(buf.capacity(), 8);
        assert_eq!(buf.total_written(), 0);
        assert!(buf.ordered().iter().all(|s| s.is_nan()));
        assert!(buf.filled().is_empty());
    }

    #[test]
    fn partial_fill_keeps_nan_prefix() {
        let mut buf = RingBuffer::new(5);
        buf.extend(&[1.0, 2.0, 3.0]);

        let ordered = buf.ordered();
        assert_eq!(ordered.len(), 5);
        assert!(ordered[0].is_nan());
        assert!(ordered[1].is_nan());
        assert_eq!(&ordered[2..], &[1.0, 2.0, 3.0]);
        assert_eq!(buf.filled(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn wraparound_overwrites_oldest() {
        let mut buf = RingBuffer::new(4);
        buf.extend(&[1.0, 2.0, 3.0, 4.0]);
        buf.extend(&[5.0, 6.0]);

        assert_eq!(buf.ordered(), vec![3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buf.total_written(), 6);
    }

    #[test]
    fn extend_larger_than_capacity_keeps_newest() {
        let mut buf = RingBuffer::new(3);
        buf.extend(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(buf.ordered(), vec![5.0, 6.0, 7.0]);
        assert_eq!(buf.total_written(), 7);
    }

    #[test]
    fn bank_ignores_aux_channels() {
        let bank = BufferBank::new(1.0, 1.0);
        bank.extend_eeg(EegChannel::AuxL, &[1.0; 12]);
        assert!(bank.snapshot_eeg(EegChannel::AuxL).is_none());

        bank.extend_eeg(EegChannel::Tp9, &[1.0; 12]);
        let (_, written) = bank.snapshot_eeg(EegChannel::Tp9).unwrap();
        assert_eq!(written, 12);
    }

    #[test]
    fn bank_splits_motion_axes() {
        let bank = BufferBank::new(1.0, 1.0);
        bank.extend_motion(MotionSensor::Gyro, &[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let (x, written) = bank.snapshot_motion(MotionSensor::Gyro, 0);
        assert_eq!(written, 2);
        assert_eq!(&x[x.len() - 2..], &[1.0, 4.0]);
        let (z, _) = bank.snapshot_motion(MotionSensor::Gyro, 2);
        assert_eq!(&z[z.len() - 2..], &[3.0, 6.0]);
    }

    proptest! {
        /// The trailing min(total_written, capacity) samples of `ordered()`
        /// always equal the most recent writes, regardless of chunking.
        #[test]
        fn ordered_tail_matches_recent_writes(
            chunks in proptest::collection::vec(
                proptest::collection::vec(-1000.0f64..1000.0, 0..20), 0..12),
            capacity in 1usize..32,
        ) {
            let mut buf = RingBuffer::new(capacity);
            let mut all: Vec<f64> = Vec::new();
            for chunk in &chunks {
                buf.extend(chunk);
                all.extend_from_slice(chunk);
            }

            prop_assert_eq!(buf.total_written(), all.len() as u64);
            let ordered = buf.ordered();
            prop_assert_eq!(ordered.len(), capacity);

            let kept = all.len().min(capacity);
            prop_assert_eq!(&ordered[capacity - kept..], &all[all.len() - kept..]);
            prop_assert!(ordered[..capacity - kept].iter().all(|s| s.is_nan()));
        }
    }
}
