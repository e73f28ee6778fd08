//! Error types for device streaming.
//!
//! All errors implement `std::error::Error` and carry structured context.
//! The taxonomy mirrors the failure policy of the session layer:
//!
//! - **Link errors**: transport operation failures (connect, write,
//!   subscribe). Retried by the bounded initial-connect policy.
//! - **Link lost**: a liveness failure detected mid-stream. Triggers the
//!   unbounded runtime-reconnect policy, never terminal on its own.
//! - **Exhausted retries**: the bounded connect policy gave up. Terminal;
//!   the device needs an external power cycle.
//!
//! Decode problems are deliberately *not* errors: the codec degrades to a
//! shorter (possibly empty) sample sequence and the session counts the
//! short frame in [`crate::SessionStats`].
//!
//! Use [`DeviceError::is_retryable`] to distinguish transient from terminal
//! failures:
//!
//! ```rust
//! use headwave::DeviceError;
//!
//! let error = DeviceError::link("connect timed out");
//! assert!(error.is_retryable());
//! ```

use std::time::Duration;
use thiserror::Error;

/// Result type alias for device operations.
pub type Result<T, E = DeviceError> = std::result::Result<T, E>;

/// Main error type for device streaming operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DeviceError {
    /// A transport operation failed (connect, subscribe, write, ...).
    #[error("link operation failed: {reason}")]
    Link {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The link dropped while streaming (not a deliberate stop).
    #[error("link lost: {reason}")]
    LinkLost { reason: String },

    /// A link operation was attempted without an established connection.
    #[error("link not connected during {operation}")]
    NotConnected { operation: &'static str },

    /// A link operation did not complete within its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The bounded initial-connect policy ran out of attempts.
    /// Terminal: the session enters `Failed` and will not retry further.
    #[error("gave up after {attempts} connection attempts")]
    ExhaustedRetries { attempts: u32 },
}

impl DeviceError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeviceError::Link { .. } => true,
            DeviceError::LinkLost { .. } => true,
            DeviceError::Timeout { .. } => true,
            DeviceError::NotConnected { .. } => false,
            DeviceError::ExhaustedRetries { .. } => false,
        }
    }

    /// Helper constructor for link operation failures.
    pub fn link(reason: impl Into<String>) -> Self {
        DeviceError::Link { reason: reason.into(), source: None }
    }

    /// Helper constructor for link operation failures with a source.
    pub fn link_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        DeviceError::Link { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for mid-stream link loss.
    pub fn link_lost(reason: impl Into<String>) -> Self {
        DeviceError::LinkLost { reason: reason.into() }
    }

    /// Helper constructor for operations on an unconnected link.
    pub fn not_connected(operation: &'static str) -> Self {
        DeviceError::NotConnected { operation }
    }

    /// Helper constructor for timeouts.
    pub fn timeout(duration: Duration) -> Self {
        DeviceError::Timeout { duration }
    }
}
