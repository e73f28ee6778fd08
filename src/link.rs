//! The transport seam between the session and a physical (or replayed)
//! device.
//!
//! Everything device-specific above the byte level lives behind [`Link`]:
//! the session drives the same handshake, subscription, and notification
//! loop against a live radio, a recorded session, or a scripted test
//! double.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::RawFrame;

/// A transport carrying GATT-style traffic to one headband.
///
/// Implementations are owned by a single session task and never shared, so
/// methods take `&mut self`. The session future is spawned onto a
/// multi-threaded runtime and holds references across await points, so
/// implementations must also be `Sync`. All methods other than
/// [`next_notification`](Link::next_notification) are expected to complete
/// quickly; the session applies its own timeouts and retry policy on top.
///
/// Transport failures surface as [`DeviceError::Link`] or
/// [`DeviceError::LinkLost`]; both are retryable and drive the session's
/// reconnect machinery rather than aborting it.
///
/// [`DeviceError::Link`]: crate::DeviceError::Link
/// [`DeviceError::LinkLost`]: crate::DeviceError::LinkLost
#[async_trait]
pub trait Link: Send + Sync + 'static {
    /// Establish the transport connection.
    async fn connect(&mut self) -> Result<()>;

    /// Tear the transport connection down.
    ///
    /// Must be idempotent: the session calls this on teardown paths where
    /// the link may already be gone.
    async fn disconnect(&mut self) -> Result<()>;

    /// List the characteristic UUIDs currently visible on the device.
    async fn characteristics(&mut self) -> Result<Vec<String>>;

    /// Enable notifications for one characteristic.
    async fn subscribe(&mut self, characteristic: &str) -> Result<()>;

    /// Write a raw command frame to the control characteristic.
    async fn write_control(&mut self, frame: &[u8]) -> Result<()>;

    /// Whether the transport currently believes it is connected.
    ///
    /// Polled by the session's watchdog; must be cheap and non-blocking.
    fn is_connected(&self) -> bool;

    /// Wait for the next notification from any subscribed characteristic.
    ///
    /// Returns `Ok(None)` when the link has delivered everything it ever
    /// will (a finished replay); the session treats that as a clean end of
    /// stream, not a fault. Transport errors return `Err` and trigger
    /// reconnection.
    async fn next_notification(&mut self) -> Result<Option<RawFrame>>;
}
