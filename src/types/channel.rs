//! Sensor channel identities and the device GATT characteristic table.

use serde::{Deserialize, Serialize};

/// GATT characteristic UUIDs exposed by the headband.
///
/// The control characteristic is always visible; the sensor characteristics
/// only appear after the wake handshake (connect, halt, disconnect,
/// reconnect).
pub mod characteristics {
    /// Control channel: length-prefixed ASCII command frames.
    pub const CONTROL: &str = "273e0001-4c4d-454d-96be-f03bac821358";

    pub const EEG_AUX_L: &str = "273e0002-4c4d-454d-96be-f03bac821358";
    pub const EEG_TP9: &str = "273e0003-4c4d-454d-96be-f03bac821358";
    pub const EEG_AF7: &str = "273e0004-4c4d-454d-96be-f03bac821358";
    pub const EEG_AF8: &str = "273e0005-4c4d-454d-96be-f03bac821358";
    pub const EEG_TP10: &str = "273e0006-4c4d-454d-96be-f03bac821358";
    pub const EEG_AUX_R: &str = "273e0007-4c4d-454d-96be-f03bac821358";

    pub const GYRO: &str = "273e0009-4c4d-454d-96be-f03bac821358";
    pub const ACCEL: &str = "273e000a-4c4d-454d-96be-f03bac821358";
    pub const TELEMETRY: &str = "273e000b-4c4d-454d-96be-f03bac821358";

    /// Every sensor characteristic the session will try to subscribe to.
    /// Absent entries are skipped silently during enumeration.
    pub const SENSORS: [&str; 9] = [
        EEG_TP9, EEG_AF7, EEG_AF8, EEG_TP10, EEG_AUX_L, EEG_AUX_R, GYRO, ACCEL, TELEMETRY,
    ];
}

/// EEG sampling rate in Hz (aggregate across packed frames).
pub const EEG_SAMPLE_RATE: f64 = 256.0;

/// Motion (accelerometer/gyroscope) sampling rate in Hz.
pub const MOTION_SAMPLE_RATE: f64 = 52.0;

/// Samples packed into one well-formed 20-byte EEG frame.
pub const EEG_SAMPLES_PER_FRAME: usize = 12;

/// Triples packed into one well-formed 20-byte motion frame.
pub const MOTION_SAMPLES_PER_FRAME: usize = 3;

/// An EEG electrode position.
///
/// TP9/TP10 are the temporal (left/right) electrodes, AF7/AF8 the frontal
/// pair. The aux positions exist on some presets and are decoded but not
/// buffered for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EegChannel {
    Tp9,
    Af7,
    Af8,
    Tp10,
    AuxL,
    AuxR,
}

impl EegChannel {
    /// The four electrodes buffered for spectral analysis, in buffer order.
    pub const PRIMARY: [EegChannel; 4] =
        [EegChannel::Tp9, EegChannel::Af7, EegChannel::Af8, EegChannel::Tp10];

    /// Electrode label as printed on the headband.
    pub fn name(self) -> &'static str {
        match self {
            EegChannel::Tp9 => "TP9",
            EegChannel::Af7 => "AF7",
            EegChannel::Af8 => "AF8",
            EegChannel::Tp10 => "TP10",
            EegChannel::AuxL => "AUX_L",
            EegChannel::AuxR => "AUX_R",
        }
    }

    /// Index into the per-channel buffer bank, `None` for aux electrodes.
    pub(crate) fn buffer_index(self) -> Option<usize> {
        match self {
            EegChannel::Tp9 => Some(0),
            EegChannel::Af7 => Some(1),
            EegChannel::Af8 => Some(2),
            EegChannel::Tp10 => Some(3),
            EegChannel::AuxL | EegChannel::AuxR => None,
        }
    }
}

impl std::fmt::Display for EegChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A three-axis motion sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionSensor {
    Accel,
    Gyro,
}

impl std::fmt::Display for MotionSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionSensor::Accel => f.write_str("ACCEL"),
            MotionSensor::Gyro => f.write_str("GYRO"),
        }
    }
}

/// Logical identity of a notification source, resolved from its
/// characteristic UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorChannel {
    Eeg(EegChannel),
    Motion(MotionSensor),
    Telemetry,
    Control,
}

impl SensorChannel {
    /// Resolve a characteristic UUID to its logical channel.
    ///
    /// Returns `None` for characteristics this crate does not decode
    /// (e.g. PPG or thermistor channels on newer firmware).
    pub fn from_uuid(uuid: &str) -> Option<Self> {
        use characteristics as c;
        match uuid {
            u if u.eq_ignore_ascii_case(c::CONTROL) => Some(SensorChannel::Control),
            u if u.eq_ignore_ascii_case(c::EEG_TP9) => Some(SensorChannel::Eeg(EegChannel::Tp9)),
            u if u.eq_ignore_ascii_case(c::EEG_AF7) => Some(SensorChannel::Eeg(EegChannel::Af7)),
            u if u.eq_ignore_ascii_case(c::EEG_AF8) => Some(SensorChannel::Eeg(EegChannel::Af8)),
            u if u.eq_ignore_ascii_case(c::EEG_TP10) => Some(SensorChannel::Eeg(EegChannel::Tp10)),
            u if u.eq_ignore_ascii_case(c::EEG_AUX_L) => Some(SensorChannel::Eeg(EegChannel::AuxL)),
            u if u.eq_ignore_ascii_case(c::EEG_AUX_R) => Some(SensorChannel::Eeg(EegChannel::AuxR)),
            u if u.eq_ignore_ascii_case(c::GYRO) => Some(SensorChannel::Motion(MotionSensor::Gyro)),
            u if u.eq_ignore_ascii_case(c::ACCEL) => {
                Some(SensorChannel::Motion(MotionSensor::Accel))
            }
            u if u.eq_ignore_ascii_case(c::TELEMETRY) => Some(SensorChannel::Telemetry),
            _ => None,
        }
    }

    /// The characteristic UUID this channel is delivered on.
    pub fn uuid(self) -> &'static str {
        use characteristics as c;
        match self {
            SensorChannel::Control => c::CONTROL,
            SensorChannel::Eeg(EegChannel::Tp9) => c::EEG_TP9,
            SensorChannel::Eeg(EegChannel::Af7) => c::EEG_AF7,
            SensorChannel::Eeg(EegChannel::Af8) => c::EEG_AF8,
            SensorChannel::Eeg(EegChannel::Tp10) => c::EEG_TP10,
            SensorChannel::Eeg(EegChannel::AuxL) => c::EEG_AUX_L,
            SensorChannel::Eeg(EegChannel::AuxR) => c::EEG_AUX_R,
            SensorChannel::Motion(MotionSensor::Gyro) => c::GYRO,
            SensorChannel::Motion(MotionSensor::Accel) => c::ACCEL,
            SensorChannel::Telemetry => c::TELEMETRY,
        }
    }
}
