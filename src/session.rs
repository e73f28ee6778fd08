//! Connection session state machine.
//!
//! One session owns one [`Link`] for its whole life and drives it through
//! the wake handshake, the streaming loop, reconnection, and teardown. The
//! session runs on its own task; observers see it through a
//! [`watch`] channel of [`ConnectionState`] and the shared event channel.
//!
//! Connection policy: the initial connect is bounded (5 attempts with a
//! linear backoff capped at 10 s, then [`ConnectionState::Failed`]), while
//! reconnection after a drop mid-stream retries forever at a fixed 3 s
//! cadence. Every delay is cancellable, and every exit path other than
//! `Failed` runs a best-effort teardown ending in
//! [`ConnectionState::Disconnected`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::buffer::BufferBank;
use crate::codec;
use crate::error::{DeviceError, Result};
use crate::link::Link;
use crate::types::{
    ConnectionState, DeviceEvent, EEG_SAMPLES_PER_FRAME, MOTION_SAMPLES_PER_FRAME, RawFrame,
    SensorChannel, characteristics,
};

/// Timing and retry knobs for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Initial connect attempts before giving up as [`ConnectionState::Failed`].
    pub max_connect_attempts: u32,
    /// Pause between handshake phases while the firmware re-registers its
    /// characteristic table.
    pub settle_delay: Duration,
    /// Pause after each control command.
    pub command_delay: Duration,
    /// Pause after the halt command during teardown.
    pub halt_delay: Duration,
    /// Pause after subscriptions before configuring the preset.
    pub subscribe_settle: Duration,
    /// How often the watchdog polls the link's connectivity.
    pub watchdog_period: Duration,
    /// Fixed delay between mid-stream reconnect attempts.
    pub reconnect_delay: Duration,
    /// Preset command selecting the sensor configuration.
    pub preset: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_connect_attempts: 5,
            settle_delay: Duration::from_millis(1500),
            command_delay: Duration::from_millis(300),
            halt_delay: Duration::from_millis(200),
            subscribe_settle: Duration::from_millis(100),
            watchdog_period: Duration::from_millis(200),
            reconnect_delay: Duration::from_secs(3),
            preset: "p21".to_string(),
        }
    }
}

/// Linear backoff after a failed connect attempt, capped at 10 s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(u64::from(attempt) * 2).min(Duration::from_secs(10))
}

/// Live session counters, updated by the session and analysis tasks and
/// readable from any thread.
#[derive(Debug)]
pub struct SessionStats {
    pub(crate) eeg_frames: AtomicU64,
    pub(crate) motion_frames: AtomicU64,
    pub(crate) telemetry_frames: AtomicU64,
    pub(crate) control_frames: AtomicU64,
    pub(crate) short_frames: AtomicU64,
    pub(crate) unknown_frames: AtomicU64,
    pub(crate) connect_attempts: AtomicU64,
    pub(crate) reconnects: AtomicU64,
    pub(crate) blinks: AtomicU64,
    /// f64 bits; NaN means no battery report yet.
    battery_bits: AtomicU64,
}

impl SessionStats {
    pub(crate) fn new() -> Self {
        Self {
            eeg_frames: AtomicU64::new(0),
            motion_frames: AtomicU64::new(0),
            telemetry_frames: AtomicU64::new(0),
            control_frames: AtomicU64::new(0),
            short_frames: AtomicU64::new(0),
            unknown_frames: AtomicU64::new(0),
            connect_attempts: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            blinks: AtomicU64::new(0),
            battery_bits: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    pub(crate) fn record_battery(&self, percent: f64) {
        self.battery_bits.store(percent.to_bits(), Ordering::Relaxed);
    }

    /// Most recent battery report, if any arrived this session.
    pub fn battery_percent(&self) -> Option<f64> {
        let value = f64::from_bits(self.battery_bits.load(Ordering::Relaxed));
        (!value.is_nan()).then_some(value)
    }

    /// Consistent-enough copy of all counters for display or logging.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            eeg_frames: self.eeg_frames.load(Ordering::Relaxed),
            motion_frames: self.motion_frames.load(Ordering::Relaxed),
            telemetry_frames: self.telemetry_frames.load(Ordering::Relaxed),
            control_frames: self.control_frames.load(Ordering::Relaxed),
            short_frames: self.short_frames.load(Ordering::Relaxed),
            unknown_frames: self.unknown_frames.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            blinks: self.blinks.load(Ordering::Relaxed),
            battery_percent: self.battery_percent(),
        }
    }
}

/// Point-in-time copy of [`SessionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub eeg_frames: u64,
    pub motion_frames: u64,
    pub telemetry_frames: u64,
    pub control_frames: u64,
    /// Frames that decoded to fewer samples than a well-formed frame holds.
    pub short_frames: u64,
    /// Notifications on characteristics this crate does not decode.
    pub unknown_frames: u64,
    pub connect_attempts: u64,
    /// Successful mid-stream re-establishments.
    pub reconnects: u64,
    pub blinks: u64,
    pub battery_percent: Option<f64>,
}

/// Why the streaming loop returned.
enum StreamEnd {
    Cancelled,
    EndOfStream,
    ConsumerGone,
    LinkLost(DeviceError),
}

/// The session task body. Owns the link; communicates outward only through
/// the state watch, the event channel, the buffer bank, and the stats.
pub(crate) struct Session<L: Link> {
    link: L,
    config: SessionConfig,
    state_tx: watch::Sender<ConnectionState>,
    events: mpsc::Sender<DeviceEvent>,
    buffers: Arc<BufferBank>,
    stats: Arc<SessionStats>,
    cancel: CancellationToken,
}

impl<L: Link> Session<L> {
    pub(crate) fn new(
        link: L,
        config: SessionConfig,
        state_tx: watch::Sender<ConnectionState>,
        events: mpsc::Sender<DeviceEvent>,
        buffers: Arc<BufferBank>,
        stats: Arc<SessionStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self { link, config, state_tx, events, buffers, stats, cancel }
    }

    /// Drive the session to completion. Always leaves the state watch on a
    /// terminal state.
    pub(crate) async fn run(mut self) {
        info!("session started");
        if let Err(e) = self.initial_connect().await {
            if self.cancel.is_cancelled() {
                self.teardown().await;
            } else {
                error!("connection failed permanently: {e}");
                self.set_state(ConnectionState::Failed).await;
            }
            return;
        }

        loop {
            match self.stream_loop().await {
                StreamEnd::Cancelled => {
                    info!("session cancelled");
                    break;
                }
                StreamEnd::EndOfStream => {
                    info!("link delivered its last notification");
                    break;
                }
                StreamEnd::ConsumerGone => {
                    debug!("event receiver dropped, shutting down");
                    break;
                }
                StreamEnd::LinkLost(e) => {
                    warn!("stream interrupted: {e}");
                    if !self.reconnect_forever().await {
                        break;
                    }
                }
            }
        }
        self.teardown().await;
    }

    /// Bounded initial connect: up to `max_connect_attempts` handshakes with
    /// a capped linear backoff between failures.
    async fn initial_connect(&mut self) -> Result<()> {
        let max = self.config.max_connect_attempts;
        for attempt in 1..=max {
            if self.cancel.is_cancelled() {
                return Err(cancelled());
            }
            self.stats.connect_attempts.fetch_add(1, Ordering::Relaxed);
            match self.establish().await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("connect attempt {attempt}/{max} failed: {e}");
                    let _ = self.link.disconnect().await;
                    if attempt < max {
                        let backoff = backoff_delay(attempt);
                        debug!("retrying in {backoff:?}");
                        if !self.delay(backoff).await {
                            return Err(cancelled());
                        }
                    }
                }
            }
        }
        Err(DeviceError::ExhaustedRetries { attempts: max })
    }

    /// One full wake handshake, from `Connecting` through `Streaming`.
    ///
    /// The firmware hides its sensor characteristics until it has been
    /// connected, halted, disconnected, and reconnected once, so every
    /// establishment walks that double-connect sequence.
    async fn establish(&mut self) -> Result<()> {
        self.set_state(ConnectionState::Connecting).await;
        self.link.connect().await?;
        // Responses to the wake commands arrive on the control channel, so
        // it must be subscribed before the first write.
        self.link.subscribe(characteristics::CONTROL).await?;

        self.set_state(ConnectionState::HandshakePhase1).await;
        self.command("v6").await?;
        self.command("s").await?;
        self.command("h").await?;

        self.set_state(ConnectionState::Disconnecting).await;
        self.link.disconnect().await?;

        self.set_state(ConnectionState::Settling).await;
        if !self.delay(self.config.settle_delay).await {
            return Err(cancelled());
        }

        self.set_state(ConnectionState::Reconnecting).await;
        self.link.connect().await?;

        self.set_state(ConnectionState::EnumeratingCharacteristics).await;
        let available = self.link.characteristics().await?;
        debug!("device exposes {} characteristics", available.len());

        self.set_state(ConnectionState::Subscribing).await;
        let mut subscribed = 0usize;
        for uuid in characteristics::SENSORS {
            if available.iter().any(|a| a.eq_ignore_ascii_case(uuid)) {
                self.link.subscribe(uuid).await?;
                subscribed += 1;
            }
        }
        if available.iter().any(|a| a.eq_ignore_ascii_case(characteristics::CONTROL)) {
            self.link.subscribe(characteristics::CONTROL).await?;
        }
        info!("subscribed to {subscribed} sensor characteristics");
        if !self.delay(self.config.subscribe_settle).await {
            return Err(cancelled());
        }

        self.set_state(ConnectionState::ConfiguringPreset).await;
        let preset = self.config.preset.clone();
        self.command(&preset).await?;
        self.command("d").await?;

        self.set_state(ConnectionState::Streaming).await;
        info!("streaming");
        Ok(())
    }

    /// Pump notifications while watching for cancellation and link death.
    async fn stream_loop(&mut self) -> StreamEnd {
        enum Wake {
            Cancelled,
            Watchdog,
            Notification(Result<Option<RawFrame>>),
        }

        let cancel = self.cancel.clone();
        let mut watchdog = tokio::time::interval(self.config.watchdog_period);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                _ = cancel.cancelled() => Wake::Cancelled,
                _ = watchdog.tick() => Wake::Watchdog,
                result = self.link.next_notification() => Wake::Notification(result),
            };
            match wake {
                Wake::Cancelled => return StreamEnd::Cancelled,
                Wake::Watchdog => {
                    if !self.link.is_connected() {
                        return StreamEnd::LinkLost(DeviceError::link_lost(
                            "watchdog: transport reports disconnected",
                        ));
                    }
                }
                Wake::Notification(Ok(Some(frame))) => {
                    if self.handle_frame(frame).await.is_err() {
                        return StreamEnd::ConsumerGone;
                    }
                }
                Wake::Notification(Ok(None)) => return StreamEnd::EndOfStream,
                Wake::Notification(Err(e)) => return StreamEnd::LinkLost(e),
            }
        }
    }

    /// Decode one notification, update buffers and stats, and publish the
    /// event. `Err` means the consumer dropped the event receiver.
    async fn handle_frame(&mut self, frame: RawFrame) -> std::result::Result<(), ()> {
        let Some(channel) = SensorChannel::from_uuid(&frame.characteristic) else {
            self.stats.unknown_frames.fetch_add(1, Ordering::Relaxed);
            trace!("ignoring notification on {}", frame.characteristic);
            return Ok(());
        };

        let event = match channel {
            SensorChannel::Eeg(eeg) => {
                self.stats.eeg_frames.fetch_add(1, Ordering::Relaxed);
                let samples = codec::decode_eeg_frame(&frame.payload);
                if samples.len() < EEG_SAMPLES_PER_FRAME {
                    self.stats.short_frames.fetch_add(1, Ordering::Relaxed);
                    debug!("short EEG frame on {eeg}: {} samples", samples.len());
                }
                if samples.is_empty() {
                    return Ok(());
                }
                self.buffers.extend_eeg(eeg, &samples);
                DeviceEvent::Eeg { channel: eeg, samples, timestamp: frame.timestamp }
            }
            SensorChannel::Motion(sensor) => {
                self.stats.motion_frames.fetch_add(1, Ordering::Relaxed);
                let samples = codec::decode_motion_frame(&frame.payload);
                if samples.len() < MOTION_SAMPLES_PER_FRAME {
                    self.stats.short_frames.fetch_add(1, Ordering::Relaxed);
                    debug!("short motion frame on {sensor}: {} triples", samples.len());
                }
                if samples.is_empty() {
                    return Ok(());
                }
                self.buffers.extend_motion(sensor, &samples);
                DeviceEvent::Motion { sensor, samples, timestamp: frame.timestamp }
            }
            SensorChannel::Telemetry => {
                self.stats.telemetry_frames.fetch_add(1, Ordering::Relaxed);
                let Some(percent) = codec::decode_telemetry(&frame.payload) else {
                    self.stats.short_frames.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                };
                self.stats.record_battery(percent);
                trace!("battery {percent:.2}%");
                DeviceEvent::Battery { percent, timestamp: frame.timestamp }
            }
            SensorChannel::Control => {
                self.stats.control_frames.fetch_add(1, Ordering::Relaxed);
                let Some(message) = codec::decode_control(&frame.payload) else {
                    return Ok(());
                };
                debug!("control response: {message}");
                DeviceEvent::Control { message, timestamp: frame.timestamp }
            }
        };
        self.events.send(event).await.map_err(|_| ())
    }

    /// Unbounded reconnection at a fixed cadence. Returns false when
    /// cancelled before the link came back.
    async fn reconnect_forever(&mut self) -> bool {
        loop {
            let _ = self.link.disconnect().await;
            if !self.delay(self.config.reconnect_delay).await {
                return false;
            }
            self.stats.connect_attempts.fetch_add(1, Ordering::Relaxed);
            match self.establish().await {
                Ok(()) => {
                    self.stats.reconnects.fetch_add(1, Ordering::Relaxed);
                    info!("link restored");
                    return true;
                }
                Err(e) => {
                    if self.cancel.is_cancelled() {
                        return false;
                    }
                    warn!("reconnect failed: {e}");
                }
            }
        }
    }

    /// Best-effort halt and disconnect. The link may already be gone, so
    /// failures here are logged and swallowed.
    async fn teardown(&mut self) {
        self.set_state(ConnectionState::Halting).await;
        match self.link.write_control(&codec::encode_command("h")).await {
            Ok(()) => tokio::time::sleep(self.config.halt_delay).await,
            Err(e) => debug!("halt command not delivered: {e}"),
        }
        if let Err(e) = self.link.disconnect().await {
            debug!("disconnect during teardown failed: {e}");
        }
        self.set_state(ConnectionState::Disconnected).await;
        info!("session ended");
    }

    /// Publish a state change on both the watch and the event channel.
    async fn set_state(&self, state: ConnectionState) {
        let previous = *self.state_tx.borrow();
        if previous == state {
            return;
        }
        debug!("state: {previous} -> {state}");
        self.state_tx.send_replace(state);
        let _ = self.events.send(DeviceEvent::StateChanged(state)).await;
    }

    /// Cancellable sleep; false means the session was cancelled mid-wait.
    async fn delay(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Send a control command and give the firmware time to act on it.
    async fn command(&mut self, cmd: &str) -> Result<()> {
        trace!("control command: {cmd}");
        self.link.write_control(&codec::encode_command(cmd)).await?;
        if !self.delay(self.config.command_delay).await {
            return Err(cancelled());
        }
        Ok(())
    }
}

fn cancelled() -> DeviceError {
    DeviceError::link("session cancelled")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{LinkProbe, ScriptedLink, Step, eeg_frame, telemetry_frame};
    use crate::types::EegChannel;
    use tokio::task::JoinHandle;
    use tokio::time::Instant;

    struct Harness {
        state: watch::Receiver<ConnectionState>,
        events: mpsc::Receiver<DeviceEvent>,
        stats: Arc<SessionStats>,
        buffers: Arc<BufferBank>,
        cancel: CancellationToken,
        task: JoinHandle<()>,
    }

    fn spawn_session(link: ScriptedLink, config: SessionConfig) -> Harness {
        let _ = tracing_subscriber::fmt::try_init();
        let (state_tx, state) = watch::channel(ConnectionState::Idle);
        let (event_tx, events) = mpsc::channel(1024);
        let buffers = Arc::new(BufferBank::new(5.0, 5.0));
        let stats = Arc::new(SessionStats::new());
        let cancel = CancellationToken::new();
        let session = Session::new(
            link,
            config,
            state_tx,
            event_tx,
            buffers.clone(),
            stats.clone(),
            cancel.clone(),
        );
        let task = tokio::spawn(session.run());
        Harness { state, events, stats, buffers, cancel, task }
    }

    fn drain_states(events: &mut mpsc::Receiver<DeviceEvent>) -> Vec<ConnectionState> {
        let mut states = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let DeviceEvent::StateChanged(s) = event {
                states.push(s);
            }
        }
        states
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_walks_the_full_state_sequence() {
        let (link, probe) = ScriptedLink::new(vec![Step::End]);
        let mut h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        assert_eq!(
            drain_states(&mut h.events),
            vec![
                ConnectionState::Connecting,
                ConnectionState::HandshakePhase1,
                ConnectionState::Disconnecting,
                ConnectionState::Settling,
                ConnectionState::Reconnecting,
                ConnectionState::EnumeratingCharacteristics,
                ConnectionState::Subscribing,
                ConnectionState::ConfiguringPreset,
                ConnectionState::Streaming,
                ConnectionState::Halting,
                ConnectionState::Disconnected,
            ]
        );

        // Wake commands in device order, then the teardown halt
        let writes = probe.control_writes.lock().unwrap();
        let expected: Vec<Vec<u8>> =
            ["v6", "s", "h", "p21", "d", "h"].iter().map(|c| codec::encode_command(c)).collect();
        assert_eq!(*writes, expected);

        // Control is subscribed in both phases, every sensor once
        let subs = probe.subscriptions.lock().unwrap();
        assert_eq!(subs.len(), characteristics::SENSORS.len() + 2);
        assert_eq!(subs[0], characteristics::CONTROL);
    }

    #[tokio::test(start_paused = true)]
    async fn control_is_subscribed_before_the_version_query() {
        let (link, probe) = ScriptedLink::new(vec![Step::End]);
        let h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        // The device answers "v6" on the control channel; a subscription
        // arriving later would drop that response.
        let ops = probe.ops.lock().unwrap();
        let control_sub = ops
            .iter()
            .position(|op| *op == format!("subscribe {}", characteristics::CONTROL))
            .expect("control subscription recorded");
        let first_write =
            ops.iter().position(|op| op.starts_with("write ")).expect("command recorded");
        assert!(control_sub < first_write, "ops: {ops:?}");
        assert_eq!(ops[first_write], "write v6");
    }

    #[tokio::test(start_paused = true)]
    async fn frames_reach_events_buffers_and_stats() {
        let (link, _) = ScriptedLink::new(vec![
            Step::Frame(eeg_frame(characteristics::EEG_TP9, 0.1)),
            Step::Frame(telemetry_frame(0.2)),
            Step::End,
        ]);
        let mut h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        let mut saw_eeg = false;
        let mut saw_battery = false;
        while let Ok(event) = h.events.try_recv() {
            match event {
                DeviceEvent::Eeg { channel, samples, .. } => {
                    assert_eq!(channel, EegChannel::Tp9);
                    assert_eq!(samples.len(), 12);
                    saw_eeg = true;
                }
                DeviceEvent::Battery { percent, .. } => {
                    assert!((percent - 87.21).abs() < 1e-9);
                    saw_battery = true;
                }
                _ => {}
            }
        }
        assert!(saw_eeg && saw_battery);

        let (_, written) = h.buffers.snapshot_eeg(EegChannel::Tp9).unwrap();
        assert_eq!(written, 12);

        let stats = h.stats.snapshot();
        assert_eq!(stats.eeg_frames, 1);
        assert_eq!(stats.telemetry_frames, 1);
        assert_eq!(stats.battery_percent, Some(87.21));
        assert_eq!(stats.connect_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_end_in_failed() {
        let (link, probe) = ScriptedLink::new(vec![]);
        let link = link.with_connect_failures(u32::MAX);
        let t0 = Instant::now();
        let h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Failed);
        assert_eq!(h.stats.snapshot().connect_attempts, 5);
        assert_eq!(probe.connects.load(Ordering::Relaxed), 5);
        // Backoff after attempts 1-4: 2 + 4 + 6 + 8 seconds
        assert!(t0.elapsed() >= Duration::from_secs(20));
        assert!(t0.elapsed() < Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_is_capped_at_ten_seconds() {
        let (link, _) = ScriptedLink::new(vec![]);
        let link = link.with_connect_failures(u32::MAX);
        let config = SessionConfig { max_connect_attempts: 7, ..SessionConfig::default() };
        let t0 = Instant::now();
        let h = spawn_session(link, config);
        h.task.await.unwrap();

        // 2 + 4 + 6 + 8 + 10 + 10: attempts 5 and 6 both wait the cap
        assert!(t0.elapsed() >= Duration::from_secs(40));
        assert!(t0.elapsed() < Duration::from_secs(41));
        assert_eq!(*h.state.borrow(), ConnectionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn fifth_attempt_succeeds_after_four_failures() {
        let (link, probe) = ScriptedLink::new(vec![Step::Pend]);
        let link = link.with_connect_failures(4);
        let t0 = Instant::now();
        let mut h = spawn_session(link, SessionConfig::default());

        while let Some(event) = h.events.recv().await {
            if event == DeviceEvent::StateChanged(ConnectionState::Streaming) {
                break;
            }
        }
        // Backoff after attempts 1-4 alone accounts for 20 s
        assert!(t0.elapsed() >= Duration::from_secs(20));
        assert_eq!(h.stats.snapshot().connect_attempts, 5);
        // 4 failed connects plus the double connect of the wake handshake
        assert_eq!(probe.connects.load(Ordering::Relaxed), 6);

        h.cancel.cancel();
        h.task.await.unwrap();
        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        assert_eq!(h.stats.snapshot().connect_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_connect_failure_is_retried() {
        let (link, _) = ScriptedLink::new(vec![Step::End]);
        let link = link.with_connect_failures(1);
        let h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        assert_eq!(h.stats.snapshot().connect_attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn link_error_triggers_reconnect_and_stream_resumes() {
        let (link, _) = ScriptedLink::new(vec![
            Step::Frame(eeg_frame(characteristics::EEG_TP9, 0.1)),
            Step::Error("gatt session dropped"),
            Step::Frame(eeg_frame(characteristics::EEG_TP9, 0.2)),
            Step::End,
        ]);
        let h = spawn_session(link, SessionConfig::default());
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        let stats = h.stats.snapshot();
        assert_eq!(stats.reconnects, 1);
        assert_eq!(stats.eeg_frames, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_catches_a_silently_dead_link() {
        let (link, probe) = ScriptedLink::new(vec![
            Step::Frame(eeg_frame(characteristics::EEG_TP9, 0.1)),
            Step::Pend,
        ]);
        let mut h = spawn_session(link, SessionConfig::default());

        // Wait until the first frame has been processed, then kill the link
        // out from under the session without surfacing an error.
        loop {
            match h.events.recv().await.unwrap() {
                DeviceEvent::Eeg { .. } => break,
                _ => {}
            }
        }
        probe.force_down.store(true, Ordering::Relaxed);

        // The session should notice within a watchdog period and walk the
        // handshake back to Streaming.
        let mut restored = false;
        while let Some(event) = h.events.recv().await {
            if event == DeviceEvent::StateChanged(ConnectionState::Streaming) {
                restored = true;
                break;
            }
        }
        assert!(restored);
        assert_eq!(h.stats.snapshot().reconnects, 1);

        h.cancel.cancel();
        h.task.await.unwrap();
        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_backoff_tears_down_instead_of_failing() {
        let (link, _) = ScriptedLink::new(vec![]);
        let link = link.with_connect_failures(u32::MAX);
        let mut h = spawn_session(link, SessionConfig::default());

        // Let the first attempt fail, then cancel during its backoff.
        loop {
            match h.events.recv().await.unwrap() {
                DeviceEvent::StateChanged(ConnectionState::Connecting) => break,
                _ => {}
            }
        }
        h.cancel.cancel();
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        assert!(h.stats.snapshot().connect_attempts < 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_streaming_ends_disconnected() {
        let (link, probe) = ScriptedLink::new(vec![Step::Pend]);
        let mut h = spawn_session(link, SessionConfig::default());

        while let Some(event) = h.events.recv().await {
            if event == DeviceEvent::StateChanged(ConnectionState::Streaming) {
                break;
            }
        }
        h.cancel.cancel();
        h.task.await.unwrap();

        assert_eq!(*h.state.borrow(), ConnectionState::Disconnected);
        // Teardown still sent the halt command
        let writes = probe.control_writes.lock().unwrap();
        assert_eq!(*writes.last().unwrap(), codec::encode_command("h"));
    }
}
