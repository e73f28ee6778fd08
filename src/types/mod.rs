//! Core types for headband data representation.
//!
//! - [`RawFrame`] / [`RecordedFrame`]: raw notification payloads, live or
//!   stored
//! - [`SensorChannel`] and the GATT [`characteristics`] table
//! - [`ConnectionState`]: the session state machine's observable state
//! - [`DeviceEvent`]: the single ordered consumer event stream
//! - Analyzer value types: [`BandPowerResult`], [`BlinkEvent`],
//!   [`AsymmetryFrame`], [`Dominance`]

mod channel;
mod event;
mod frame;
mod results;
mod state;

pub use channel::{
    EEG_SAMPLE_RATE, EEG_SAMPLES_PER_FRAME, EegChannel, MOTION_SAMPLE_RATE,
    MOTION_SAMPLES_PER_FRAME, MotionSensor, SensorChannel, characteristics,
};
pub use event::DeviceEvent;
pub use frame::{RawFrame, RecordedFrame};
pub use results::{AsymmetryFrame, BandPowerResult, BandPowers, BlinkEvent, Dominance};
pub use state::ConnectionState;
