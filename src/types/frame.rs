//! Raw notification frames.

use serde::{Deserialize, Serialize};

/// One raw notification payload from a single characteristic.
///
/// This is the fundamental unit flowing from a [`crate::Link`] into the
/// session: an opaque byte payload (typically 20 bytes), tagged with the
/// characteristic it arrived on and a link-assigned arrival timestamp in
/// seconds. The session owns the frame until it is handed to the codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Characteristic UUID the notification arrived on.
    pub characteristic: String,

    /// Notification payload bytes.
    pub payload: Vec<u8>,

    /// Arrival time in seconds, on the link's own timeline.
    ///
    /// Live links stamp receipt time; the replay link reuses the recorded
    /// offset so replayed sessions decode deterministically.
    pub timestamp: f64,
}

impl RawFrame {
    /// Create a new raw frame.
    pub fn new(characteristic: impl Into<String>, payload: Vec<u8>, timestamp: f64) -> Self {
        Self { characteristic: characteristic.into(), payload, timestamp }
    }
}

/// A stored notification for offline playback, position expressed as an
/// offset from the start of the recording.
///
/// The same codec path handles live and recorded frames, so replaying a
/// stored sequence produces bit-identical decode output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Characteristic UUID the notification was captured from.
    pub characteristic: String,

    /// Captured payload bytes.
    pub payload: Vec<u8>,

    /// Seconds since the start of the recording.
    pub offset_secs: f64,
}

impl RecordedFrame {
    /// Create a new recorded frame.
    pub fn new(characteristic: impl Into<String>, payload: Vec<u8>, offset_secs: f64) -> Self {
        Self { characteristic: characteristic.into(), payload, offset_secs }
    }
}
