//! Binary frame codec.
//!
//! Pure decode/encode functions mapping the headband's fixed-size
//! notification payloads to physical-unit samples and command strings to
//! control frames. Every decoder is a deterministic function of its input
//! bytes, so live notifications and replayed recordings decode identically.
//!
//! Error policy: decoders never fail. A truncated or malformed payload
//! yields a shorter (possibly empty) sample sequence; the session counts
//! short frames in its statistics but keeps streaming.

use crate::types::{EEG_SAMPLES_PER_FRAME, MOTION_SAMPLES_PER_FRAME};

/// Affine scale from a 12-bit raw reading to microvolts.
const EEG_SCALE_UV: f64 = 1000.0 / 2048.0;

/// Decode up to 12 EEG samples from one notification payload.
///
/// The first two payload bytes are a packet counter. Behind them, each
/// sample packs 12 bits across a nibble-aligned byte stream: even-indexed
/// samples take a full byte plus the high nibble of the next, odd-indexed
/// samples take the low nibble of the current byte plus the next full byte.
/// The raw unsigned reading `r ∈ [0, 4095]` maps to
/// `(r − 2048) × 1000 / 2048` µV.
///
/// Decoding stops at the first sample whose bytes are not fully present, so
/// a payload shorter than 3 bytes yields an empty vec.
pub fn decode_eeg_frame(payload: &[u8]) -> Vec<f64> {
    let mut samples = Vec::with_capacity(EEG_SAMPLES_PER_FRAME);
    for i in 0..EEG_SAMPLES_PER_FRAME {
        let byte_idx = 2 + (i * 3) / 2;
        if byte_idx + 1 >= payload.len() {
            break;
        }
        let raw = if i % 2 == 0 {
            (u16::from(payload[byte_idx]) << 4) | (u16::from(payload[byte_idx + 1]) >> 4)
        } else {
            (u16::from(payload[byte_idx] & 0x0F) << 8) | u16::from(payload[byte_idx + 1])
        };
        samples.push((f64::from(raw) - 2048.0) * EEG_SCALE_UV);
    }
    samples
}

/// Decode up to 3 motion triples (x, y, z) from one notification payload.
///
/// Triples are consecutive 6-byte groups of signed 16-bit big-endian
/// integers starting at payload offset 2. Decoding stops early when fewer
/// than 6 bytes remain.
pub fn decode_motion_frame(payload: &[u8]) -> Vec<[f64; 3]> {
    let mut triples = Vec::with_capacity(MOTION_SAMPLES_PER_FRAME);
    for i in 0..MOTION_SAMPLES_PER_FRAME {
        let offset = 2 + i * 6;
        if offset + 6 > payload.len() {
            break;
        }
        let x = i16::from_be_bytes([payload[offset], payload[offset + 1]]);
        let y = i16::from_be_bytes([payload[offset + 2], payload[offset + 3]]);
        let z = i16::from_be_bytes([payload[offset + 4], payload[offset + 5]]);
        triples.push([f64::from(x), f64::from(y), f64::from(z)]);
    }
    triples
}

/// Decode a battery percentage from a telemetry payload.
///
/// The charge is an unsigned 16-bit big-endian value at offset 2, in
/// hundredths of a percent. Returns `None` when the payload is shorter
/// than 4 bytes (no update).
pub fn decode_telemetry(payload: &[u8]) -> Option<f64> {
    if payload.len() < 4 {
        return None;
    }
    let raw = u16::from_be_bytes([payload[2], payload[3]]);
    Some(f64::from(raw) / 100.0)
}

/// Decode a control-channel response into its ASCII text.
///
/// Byte 0 is the device's length prefix; the rest is the response body,
/// decoded lossily and trimmed. Returns `None` for an empty payload.
pub fn decode_control(payload: &[u8]) -> Option<String> {
    if payload.len() < 2 {
        return None;
    }
    let text = String::from_utf8_lossy(&payload[1..]);
    Some(text.trim_end_matches(['\0', '\n', '\r']).to_string())
}

/// Encode a command string as a control frame.
///
/// Wire format: byte 0 is `len(command) + 1`, then the ASCII command bytes,
/// terminated by `0x0A`.
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(command.len() + 2);
    frame.push(command.len() as u8 + 1);
    frame.extend_from_slice(command.as_bytes());
    frame.push(0x0A);
    frame
}
