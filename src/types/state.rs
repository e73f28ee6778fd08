//! Connection session states.

use serde::{Deserialize, Serialize};

/// State of the connection session.
///
/// The device firmware exposes its full characteristic table only after a
/// connect, halt, disconnect, reconnect cycle, so every session walks the
/// full sequence before any sensor data is visible:
///
/// `Idle → Connecting → HandshakePhase1 → Disconnecting → Settling →
/// Reconnecting → EnumeratingCharacteristics → Subscribing →
/// ConfiguringPreset → Streaming`
///
/// An explicit stop from any state passes through `Halting` and always ends
/// in `Disconnected`. `Failed` is terminal: the bounded connect policy was
/// exhausted and the device needs an external power cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Idle,
    Connecting,
    HandshakePhase1,
    Disconnecting,
    Settling,
    Reconnecting,
    EnumeratingCharacteristics,
    Subscribing,
    ConfiguringPreset,
    Streaming,
    Halting,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// Whether the session will make no further progress from this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::HandshakePhase1 => "handshake-phase-1",
            ConnectionState::Disconnecting => "disconnecting",
            ConnectionState::Settling => "settling",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::EnumeratingCharacteristics => "enumerating-characteristics",
            ConnectionState::Subscribing => "subscribing",
            ConnectionState::ConfiguringPreset => "configuring-preset",
            ConnectionState::Streaming => "streaming",
            ConnectionState::Halting => "halting",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ConnectionState::Disconnected.is_terminal());
        assert!(ConnectionState::Failed.is_terminal());
        assert!(!ConnectionState::Streaming.is_terminal());
        assert!(!ConnectionState::Idle.is_terminal());
    }
}
