//! Async client library for a consumer EEG headband.
//!
//! Headwave connects to a Muse-style headband, drives its multi-phase wake
//! handshake, decodes its notification frames into physical units, and runs
//! windowed spectral analysis over the live signal.
//!
//! # Features
//!
//! - **Resilient sessions**: bounded initial connect with backoff, unbounded
//!   mid-stream reconnection, watchdog-detected link death
//! - **One event stream**: decoded samples, battery telemetry, state changes,
//!   and analyzer results on a single ordered channel
//! - **Spectral analysis**: Welch band powers, blink detection, and
//!   hemispheric alpha asymmetry
//! - **Deterministic replay**: recorded sessions play back through the same
//!   codec and analysis path as live data
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use headwave::{DeviceEvent, Headwave, RecordedFrame};
//!
//! #[tokio::main]
//! async fn main() {
//!     let frames: Vec<RecordedFrame> = load_recording();
//!     let mut device = Headwave::replay(frames);
//!
//!     while let Some(event) = device.next_event().await {
//!         match event {
//!             DeviceEvent::BandPower(result) => {
//!                 println!("alpha: {:.3} at {:.1}s", result.bands.alpha, result.timestamp);
//!             }
//!             DeviceEvent::Blink(blink) => println!("blink at {:.2}s", blink.timestamp),
//!             _ => {}
//!         }
//!     }
//! }
//! # fn load_recording() -> Vec<headwave::RecordedFrame> { Vec::new() }
//! ```

// Core types and error handling
pub mod buffer;
pub mod codec;
mod error;
#[cfg(test)]
pub mod test_utils;
pub mod types;

// Session architecture
pub mod link;
pub mod links;
pub mod pipeline;
pub mod session;

// Signal processing
pub mod analysis;

// Core exports
pub use error::{DeviceError, Result};
pub use types::*;

// Main API exports
pub use analysis::{AnalysisConfig, Analyzer};
pub use link::Link;
pub use links::ReplayLink;
pub use pipeline::{DeviceHandle, PipelineConfig};
pub use session::{SessionConfig, SessionStats, StatsSnapshot};

/// Unified entry point for device pipelines.
///
/// Spawns the session and analysis tasks over a [`Link`] and returns the
/// [`DeviceHandle`] a consumer drains. Live transports implement [`Link`];
/// recorded sessions replay through [`ReplayLink`].
pub struct Headwave;

impl Headwave {
    /// Start a pipeline over any link with default configuration.
    pub fn connect<L: Link>(link: L) -> DeviceHandle {
        Self::connect_with(link, PipelineConfig::default())
    }

    /// Start a pipeline over any link with explicit configuration.
    pub fn connect_with<L: Link>(link: L, config: PipelineConfig) -> DeviceHandle {
        DeviceHandle::spawn(link, config)
    }

    /// Replay a recorded session at real-time speed.
    ///
    /// The recording flows through the same handshake, codec, buffer, and
    /// analysis path as a live device, so two replays of the same frames
    /// produce identical event streams.
    pub fn replay(frames: Vec<RecordedFrame>) -> DeviceHandle {
        Self::connect(ReplayLink::new(frames))
    }

    /// Replay a recorded session at a scaled speed (clamped to 0.1–10×).
    pub fn replay_at(frames: Vec<RecordedFrame>, speed: f64) -> DeviceHandle {
        Self::connect(ReplayLink::new(frames).with_speed(speed))
    }
}
