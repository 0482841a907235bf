//! Playback session controller
//!
//! Top-level surface for one playback cell: owns the connection state
//! machine, the double-buffered timeline, and the seek debouncer. One
//! controller manages at most one active session; a second `start` without an
//! intervening `stop` is an error.

use crate::config::PlaybackConfig;
use crate::media::{MediaSessionFactory, MediaSink, MediaStats};
use crate::session::state::{ConnectionState, ConnectionStateMachine, StateCallback};
use crate::signaling::{HttpSignalingClient, PlaybackRequest, SignalingTransport};
use crate::timeline::{
    zoom_level, BufferUpdate, DoubleBufferController, RecordingSequence, TimelineSnapshot,
};
use crate::webrtc_session::WebRtcSessionFactory;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Zoom level shown before the user picks one ("1 hr")
pub const DEFAULT_ZOOM_INDEX: usize = 3;

struct TimelineState {
    buffers: DoubleBufferController,
    zoom_index: usize,
    playhead: DateTime<Utc>,
    sequences: Vec<RecordingSequence>,
}

#[derive(Default)]
struct SeekState {
    /// Last requested target; later requests inside the debounce window
    /// overwrite it, so only the final one restarts the session.
    pending: Option<DateTime<Utc>>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    config: PlaybackConfig,
    machine: ConnectionStateMachine,
    timeline: parking_lot::Mutex<TimelineState>,
    seek: parking_lot::Mutex<SeekState>,
    active: parking_lot::Mutex<Option<PlaybackRequest>>,
}

/// Coordinates one playback cell's session, timeline, and seeks
pub struct PlaybackSessionController {
    inner: Arc<Inner>,
}

impl PlaybackSessionController {
    /// Create a controller with the production HTTP signaling client and
    /// WebRTC media stack.
    pub fn new(
        config: PlaybackConfig,
        sink: Arc<dyn MediaSink>,
        callback: StateCallback,
    ) -> Result<Self> {
        config.validate()?;
        let signaling: Arc<dyn SignalingTransport> = Arc::new(HttpSignalingClient::new(
            config.signaling_base_url.clone(),
            config.auth_token.clone(),
        )?);
        let factory: Arc<dyn MediaSessionFactory> =
            Arc::new(WebRtcSessionFactory::new(config.clone()));
        Ok(Self::with_transports(config, signaling, factory, sink, callback))
    }

    /// Create a controller over explicit transports (tests, alternative
    /// signaling backends).
    pub fn with_transports(
        config: PlaybackConfig,
        signaling: Arc<dyn SignalingTransport>,
        factory: Arc<dyn MediaSessionFactory>,
        sink: Arc<dyn MediaSink>,
        callback: StateCallback,
    ) -> Self {
        let machine =
            ConnectionStateMachine::new(config.clone(), signaling, factory, sink, callback);
        let zoom = zoom_level(DEFAULT_ZOOM_INDEX);
        Self {
            inner: Arc::new(Inner {
                config,
                machine,
                timeline: parking_lot::Mutex::new(TimelineState {
                    buffers: DoubleBufferController::new(Utc::now(), zoom.duration_ms()),
                    zoom_index: DEFAULT_ZOOM_INDEX,
                    playhead: Utc::now(),
                    sequences: Vec::new(),
                }),
                seek: parking_lot::Mutex::new(SeekState::default()),
                active: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Begin playback. Fails with [`Error::SessionActive`] if this cell
    /// already has a live session; a `Failed`/`Disconnected` one is replaced,
    /// so recovering from a failure is just another `start`.
    pub async fn start(&self, request: PlaybackRequest) -> Result<()> {
        {
            let mut active = self.inner.active.lock();
            if let Some(current) = active.as_ref() {
                match self.inner.machine.state() {
                    ConnectionState::Failed | ConnectionState::Disconnected => {}
                    _ => {
                        return Err(Error::SessionActive(format!(
                            "camera {} already playing",
                            current.camera_id
                        )));
                    }
                }
            }
            *active = Some(request.clone());
        }

        // A debounced seek left over from a replaced session must not fire
        if let Some(task) = {
            let mut seek = self.inner.seek.lock();
            seek.pending = None;
            seek.task.take()
        } {
            task.abort();
        }

        {
            let mut timeline = self.inner.timeline.lock();
            let zoom = zoom_level(timeline.zoom_index);
            timeline.buffers =
                DoubleBufferController::new(request.playback_time, zoom.duration_ms());
            timeline.playhead = request.playback_time;
        }

        info!(
            "Starting playback: camera {} at {}",
            request.camera_id, request.playback_time
        );
        if let Err(e) = self.inner.machine.start(request).await {
            *self.inner.active.lock() = None;
            return Err(e);
        }
        Ok(())
    }

    /// Seek to a new recorded-time instant.
    ///
    /// With `immediate = true` (skip buttons, timeline clicks) the seek is
    /// applied and the session restarted right away. Otherwise nothing is
    /// applied until the debounce window elapses: intermediate targets from a
    /// scrub burst are superseded, and only the last one moves the timeline
    /// and restarts the session.
    pub async fn seek(&self, time: DateTime<Utc>, immediate: bool) -> Result<()> {
        if self.inner.active.lock().is_none() {
            return Err(Error::SessionActive(
                "no active session to seek".to_string(),
            ));
        }

        if immediate {
            if let Some(task) = {
                let mut seek = self.inner.seek.lock();
                seek.pending = None;
                seek.task.take()
            } {
                task.abort();
            }
            Inner::apply_playhead(&self.inner, time);
            Inner::restart_at(&self.inner, time).await;
            return Ok(());
        }

        let mut seek = self.inner.seek.lock();
        seek.pending = Some(time);
        if let Some(task) = seek.task.take() {
            task.abort();
        }
        let inner = Arc::clone(&self.inner);
        let debounce = Duration::from_millis(self.inner.config.seek_debounce_ms);
        seek.task = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let target = inner.seek.lock().pending.take();
            if let Some(target) = target {
                Inner::apply_playhead(&inner, target);
                Inner::restart_at(&inner, target).await;
            }
        }));
        Ok(())
    }

    /// Stop playback and tear the session down. Idempotent.
    pub async fn stop(&self) {
        if let Some(task) = {
            let mut seek = self.inner.seek.lock();
            seek.pending = None;
            seek.task.take()
        } {
            task.abort();
        }

        let was_active = self.inner.active.lock().take();
        if let Some(request) = &was_active {
            info!("Stopping playback for camera {}", request.camera_id);
        }
        self.inner.machine.shutdown().await;
    }

    /// Switch zoom level by table index (clamped). Cancels any in-flight
    /// buffer preload and recenters on the current playhead.
    pub fn set_zoom(&self, index: usize) {
        let mut timeline = self.inner.timeline.lock();
        let zoom = zoom_level(index);
        timeline.zoom_index = index.min(crate::timeline::ZOOM_LEVELS.len() - 1);
        let playhead = timeline.playhead;
        timeline.buffers.set_zoom(zoom.duration_ms(), playhead);
        debug!("Zoom set to {}", zoom.label);
    }

    /// Feed one playhead update from the media clock. Call once per rendering
    /// frame while playing.
    pub fn on_playhead(&self, time: DateTime<Utc>) -> BufferUpdate {
        self.advance_playhead(time)
    }

    /// Replace the recording-availability sequences shown on the timeline
    pub fn set_sequences(&self, sequences: Vec<RecordingSequence>) {
        self.inner.timeline.lock().sequences = sequences;
    }

    /// Render data for the current frame
    pub fn timeline_snapshot(
        &self,
        viewport_width_px: f64,
        content_width_px: f64,
    ) -> TimelineSnapshot {
        let timeline = self.inner.timeline.lock();
        crate::timeline::snapshot(
            timeline.buffers.active_window(),
            zoom_level(timeline.zoom_index),
            &timeline.sequences,
            viewport_width_px,
            content_width_px,
            timeline.playhead,
        )
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.inner.machine.state()
    }

    /// Most recent connection statistics sample
    pub fn last_stats(&self) -> Option<MediaStats> {
        self.inner.machine.last_stats()
    }

    /// Current zoom table index
    pub fn zoom_index(&self) -> usize {
        self.inner.timeline.lock().zoom_index
    }

    /// Current playhead instant
    pub fn playhead(&self) -> DateTime<Utc> {
        self.inner.timeline.lock().playhead
    }

    fn advance_playhead(&self, time: DateTime<Utc>) -> BufferUpdate {
        Inner::apply_playhead(&self.inner, time)
    }
}

impl Inner {
    fn apply_playhead(inner: &Inner, time: DateTime<Utc>) -> BufferUpdate {
        let mut timeline = inner.timeline.lock();
        timeline.playhead = time;
        timeline.buffers.advance(time)
    }

    /// Tear the current session down and start a fresh one at `time`.
    /// Failures surface through the state callback, same as any session.
    async fn restart_at(inner: &Arc<Inner>, time: DateTime<Utc>) {
        let request = {
            let mut active = inner.active.lock();
            let Some(current) = active.as_mut() else {
                return;
            };
            current.playback_time = time;
            current.clone()
        };

        debug!(
            "Seek restart: camera {} at {}",
            request.camera_id, request.playback_time
        );
        inner.machine.shutdown().await;
        if let Err(e) = inner.machine.start(request).await {
            warn!("Seek restart failed: {}", e);
        }
    }
}
