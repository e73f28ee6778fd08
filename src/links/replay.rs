//! Offline playback of a recorded notification stream.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::error::{DeviceError, Result};
use crate::link::Link;
use crate::types::{RawFrame, RecordedFrame, characteristics};

/// Fastest and slowest supported playback rates.
const SPEED_RANGE: (f64, f64) = (0.1, 10.0);

/// A [`Link`] that replays a recorded session through the normal decode
/// path.
///
/// Frames are delivered in recorded order, paced to their recorded offsets
/// (optionally scaled by a playback speed). Each frame carries its recorded
/// offset as its timestamp, so two replays of the same recording produce
/// identical event streams. Playback position survives the
/// disconnect/reconnect cycle of the wake handshake.
#[derive(Debug)]
pub struct ReplayLink {
    frames: Vec<RecordedFrame>,
    position: usize,
    speed: f64,
    started: Option<Instant>,
    connected: bool,
    subscribed: HashSet<String>,
}

impl ReplayLink {
    /// Create a replay link over a recorded frame sequence, played at
    /// real-time speed.
    pub fn new(frames: Vec<RecordedFrame>) -> Self {
        Self {
            frames,
            position: 0,
            speed: 1.0,
            started: None,
            connected: false,
            subscribed: HashSet::new(),
        }
    }

    /// Set the playback rate. Values are clamped to 0.1–10×.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() {
            speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
        } else {
            1.0
        };
        self
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len() - self.position
    }
}

#[async_trait]
impl Link for ReplayLink {
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        debug!(frames = self.frames.len(), position = self.position, "replay link connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // Playback position is kept so the handshake's disconnect/reconnect
        // cycle does not rewind the recording.
        self.connected = false;
        self.subscribed.clear();
        Ok(())
    }

    async fn characteristics(&mut self) -> Result<Vec<String>> {
        if !self.connected {
            return Err(DeviceError::not_connected("characteristics"));
        }
        let mut uuids = vec![characteristics::CONTROL.to_string()];
        let mut seen: HashSet<&str> = HashSet::new();
        for frame in &self.frames {
            if seen.insert(&frame.characteristic) {
                uuids.push(frame.characteristic.clone());
            }
        }
        Ok(uuids)
    }

    async fn subscribe(&mut self, characteristic: &str) -> Result<()> {
        if !self.connected {
            return Err(DeviceError::not_connected("subscribe"));
        }
        self.subscribed.insert(characteristic.to_ascii_lowercase());
        Ok(())
    }

    async fn write_control(&mut self, frame: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(DeviceError::not_connected("write_control"));
        }
        // Recordings have no device to command; log and drop.
        trace!(len = frame.len(), "control write ignored by replay link");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn next_notification(&mut self) -> Result<Option<RawFrame>> {
        if !self.connected {
            return Err(DeviceError::link_lost("replay link not connected"));
        }
        loop {
            let Some(frame) = self.frames.get(self.position) else {
                return Ok(None);
            };

            let started = *self.started.get_or_insert_with(Instant::now);
            let due = started + Duration::from_secs_f64(frame.offset_secs / self.speed);
            tokio::time::sleep_until(due).await;

            self.position += 1;
            if !self.subscribed.contains(&frame.characteristic.to_ascii_lowercase()) {
                continue;
            }
            return Ok(Some(RawFrame::new(
                frame.characteristic.clone(),
                frame.payload.clone(),
                frame.offset_secs,
            )));
        }
    }
}
