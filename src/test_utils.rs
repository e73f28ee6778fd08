//! Scripted link implementations for exercising the session state machine
//! without a device.

#![cfg(test)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{DeviceError, Result};
use crate::link::Link;
use crate::types::{RawFrame, characteristics};

/// One step of a scripted notification stream.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver this frame.
    Frame(RawFrame),
    /// Fail with a lost-link error.
    Error(&'static str),
    /// Report a clean end of stream.
    End,
    /// Never resolve. The step is not consumed, so the link stays silent
    /// until cancelled or declared dead by the watchdog.
    Pend,
}

/// Counters and captures shared between a [`ScriptedLink`] and its test.
#[derive(Debug, Default)]
pub struct LinkProbe {
    pub connects: AtomicU32,
    pub disconnects: AtomicU32,
    pub control_writes: Mutex<Vec<Vec<u8>>>,
    pub subscriptions: Mutex<Vec<String>>,
    /// Every subscribe and control write, interleaved in call order.
    pub ops: Mutex<Vec<String>>,
    /// When set, `is_connected` reports false until the next `connect`.
    pub force_down: AtomicBool,
}

/// A [`Link`] that follows a fixed script of notifications and can be made
/// to fail on demand.
#[derive(Debug)]
pub struct ScriptedLink {
    script: VecDeque<Step>,
    connect_failures: u32,
    connected: bool,
    probe: Arc<LinkProbe>,
}

impl ScriptedLink {
    pub fn new(script: Vec<Step>) -> (Self, Arc<LinkProbe>) {
        let probe = Arc::new(LinkProbe::default());
        let link = Self {
            script: script.into(),
            connect_failures: 0,
            connected: false,
            probe: probe.clone(),
        };
        (link, probe)
    }

    /// Fail the first `n` connect calls.
    pub fn with_connect_failures(mut self, n: u32) -> Self {
        self.connect_failures = n;
        self
    }
}

#[async_trait]
impl Link for ScriptedLink {
    async fn connect(&mut self) -> Result<()> {
        self.probe.connects.fetch_add(1, Ordering::Relaxed);
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(DeviceError::link("scripted connect failure"));
        }
        self.connected = true;
        self.probe.force_down.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.probe.disconnects.fetch_add(1, Ordering::Relaxed);
        self.connected = false;
        Ok(())
    }

    async fn characteristics(&mut self) -> Result<Vec<String>> {
        let mut uuids = vec![characteristics::CONTROL.to_string()];
        uuids.extend(characteristics::SENSORS.iter().map(|u| u.to_string()));
        Ok(uuids)
    }

    async fn subscribe(&mut self, characteristic: &str) -> Result<()> {
        self.probe.subscriptions.lock().unwrap().push(characteristic.to_string());
        self.probe.ops.lock().unwrap().push(format!("subscribe {characteristic}"));
        Ok(())
    }

    async fn write_control(&mut self, frame: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(DeviceError::not_connected("write_control"));
        }
        let command = String::from_utf8_lossy(&frame[1..frame.len() - 1]).into_owned();
        self.probe.ops.lock().unwrap().push(format!("write {command}"));
        self.probe.control_writes.lock().unwrap().push(frame.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected && !self.probe.force_down.load(Ordering::Relaxed)
    }

    async fn next_notification(&mut self) -> Result<Option<RawFrame>> {
        if !self.connected {
            return Err(DeviceError::link_lost("scripted link not connected"));
        }
        match self.script.front() {
            Some(Step::Pend) | None => std::future::pending().await,
            _ => {}
        }
        match self.script.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Error(reason)) => Err(DeviceError::link_lost(reason)),
            Some(Step::End) => Ok(None),
            Some(Step::Pend) | None => unreachable!(),
        }
    }
}

/// A well-formed 20-byte EEG notification on the given characteristic.
pub fn eeg_frame(characteristic: &str, timestamp: f64) -> RawFrame {
    RawFrame::new(characteristic, vec![0u8; 20], timestamp)
}

/// A telemetry notification reporting 87.21% battery.
pub fn telemetry_frame(timestamp: f64) -> RawFrame {
    RawFrame::new(characteristics::TELEMETRY, vec![0x00, 0x00, 0x22, 0x11], timestamp)
}
