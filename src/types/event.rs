//! Consumer-facing device events.

use serde::{Deserialize, Serialize};

use super::channel::{EegChannel, MotionSensor};
use super::results::{AsymmetryFrame, BandPowerResult, BlinkEvent};
use super::state::ConnectionState;

/// One event on the consumer channel.
///
/// All events — decoded samples, telemetry, state changes, and analyzer
/// results — are delivered on a single ordered channel, preserving
/// cross-channel arrival order. This replaces the per-characteristic
/// callback dispatch a notification API would otherwise force on the
/// consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// Decoded EEG samples in microvolts from one notification frame.
    Eeg { channel: EegChannel, samples: Vec<f64>, timestamp: f64 },

    /// Decoded motion triples (x, y, z) from one notification frame.
    Motion { sensor: MotionSensor, samples: Vec<[f64; 3]>, timestamp: f64 },

    /// Battery charge update in percent.
    Battery { percent: f64, timestamp: f64 },

    /// ASCII response text on the control channel.
    Control { message: String, timestamp: f64 },

    /// The session moved to a new connection state.
    StateChanged(ConnectionState),

    /// Band powers for a completed analysis window.
    BandPower(BandPowerResult),

    /// A blink-like transient was detected.
    Blink(BlinkEvent),

    /// Hemispheric alpha asymmetry for a completed analysis window.
    Asymmetry(AsymmetryFrame),
}
