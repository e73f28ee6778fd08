//! Task wiring: one session task and one analysis task behind a single
//! consumer handle.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::analysis::{AnalysisConfig, Analyzer};
use crate::buffer::BufferBank;
use crate::link::Link;
use crate::session::{Session, SessionConfig, SessionStats, StatsSnapshot};
use crate::types::{ConnectionState, DeviceEvent};

/// Everything tunable about a spawned device pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub session: SessionConfig,
    pub analysis: AnalysisConfig,
    /// Analysis task tick period.
    pub render_tick: Duration,
    /// Run the analyzer every Nth tick.
    pub analysis_every: u32,
    /// Bound of the consumer event channel.
    pub event_capacity: usize,
    /// Per-channel EEG history, seconds.
    pub eeg_buffer_secs: f64,
    /// Per-axis motion history, seconds.
    pub motion_buffer_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            analysis: AnalysisConfig::default(),
            render_tick: Duration::from_millis(200),
            analysis_every: 5,
            event_capacity: 256,
            eeg_buffer_secs: 5.0,
            motion_buffer_secs: 5.0,
        }
    }
}

/// Owning handle to a running device pipeline.
///
/// Session and analysis both publish into the same bounded event channel, so
/// a consumer draining [`next_event`](DeviceHandle::next_event) sees decoded
/// samples, state changes, and analyzer results in one ordered stream.
/// Dropping the handle cancels both tasks; [`stop`](DeviceHandle::stop)
/// additionally waits for them to finish their teardown.
pub struct DeviceHandle {
    events: mpsc::Receiver<DeviceEvent>,
    state: watch::Receiver<ConnectionState>,
    buffers: Arc<BufferBank>,
    stats: Arc<SessionStats>,
    cancel: CancellationToken,
    session_task: Option<JoinHandle<()>>,
    analysis_task: Option<JoinHandle<()>>,
}

impl DeviceHandle {
    /// Spawn the session and analysis tasks over the given link.
    pub(crate) fn spawn<L: Link>(link: L, config: PipelineConfig) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let buffers = Arc::new(BufferBank::new(config.eeg_buffer_secs, config.motion_buffer_secs));
        let stats = Arc::new(SessionStats::new());
        let cancel = CancellationToken::new();

        let session = Session::new(
            link,
            config.session,
            state_tx,
            event_tx.clone(),
            buffers.clone(),
            stats.clone(),
            cancel.clone(),
        );
        let session_task = tokio::spawn(session.run());

        let analyzer = Analyzer::new(config.analysis);
        let analysis_task = tokio::spawn(analysis_task(
            analyzer,
            buffers.clone(),
            event_tx,
            state_rx.clone(),
            stats.clone(),
            cancel.clone(),
            config.render_tick,
            config.analysis_every.max(1),
        ));

        Self {
            events: event_rx,
            state: state_rx,
            buffers,
            stats,
            cancel,
            session_task: Some(session_task),
            analysis_task: Some(analysis_task),
        }
    }

    /// Receive the next event, or `None` once both tasks have ended and the
    /// channel is drained.
    pub async fn next_event(&mut self) -> Option<DeviceEvent> {
        self.events.recv().await
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Stream of connection state changes, starting from the current state.
    pub fn state_updates(&self) -> WatchStream<ConnectionState> {
        WatchStream::new(self.state.clone())
    }

    /// Most recent battery report, if any.
    pub fn battery(&self) -> Option<f64> {
        self.stats.battery_percent()
    }

    /// Current session counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Shared sample history, for consumers doing their own windowed math.
    pub fn buffers(&self) -> Arc<BufferBank> {
        self.buffers.clone()
    }

    /// Cancel both tasks and wait for the session to finish its teardown.
    pub async fn stop(mut self) {
        info!("stopping device pipeline");
        self.cancel.cancel();
        if let Some(task) = self.session_task.take() {
            let _ = task.await;
        }
        if let Some(task) = self.analysis_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Periodic analysis over the shared buffers while the session streams.
#[allow(clippy::too_many_arguments)]
async fn analysis_task(
    mut analyzer: Analyzer,
    buffers: Arc<BufferBank>,
    events: mpsc::Sender<DeviceEvent>,
    mut state: watch::Receiver<ConnectionState>,
    stats: Arc<SessionStats>,
    cancel: CancellationToken,
    tick_period: Duration,
    analysis_every: u32,
) {
    enum Wake {
        Cancelled,
        StateEvent { sender_gone: bool },
        Tick,
    }

    let mut ticker = tokio::time::interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u32;

    loop {
        let wake = tokio::select! {
            _ = cancel.cancelled() => Wake::Cancelled,
            changed = state.changed() => Wake::StateEvent { sender_gone: changed.is_err() },
            _ = ticker.tick() => Wake::Tick,
        };
        match wake {
            Wake::Cancelled => break,
            Wake::StateEvent { sender_gone } => {
                if sender_gone || state.borrow().is_terminal() {
                    break;
                }
            }
            Wake::Tick => {
                tick = tick.wrapping_add(1);
                if tick % analysis_every != 0 || *state.borrow() != ConnectionState::Streaming {
                    continue;
                }
                for event in analyzer.analyze(&buffers) {
                    if matches!(event, DeviceEvent::Blink(_)) {
                        stats.blinks.fetch_add(1, Ordering::Relaxed);
                    }
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
    debug!(
        "analysis task ended ({} blinks, dominance {})",
        analyzer.blink_total(),
        analyzer.dominance()
    );
}
