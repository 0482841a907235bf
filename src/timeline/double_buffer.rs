//! Double-buffered timeline window controller
//!
//! Keeps two alternating buffer windows (A/B) so one can be pre-computed
//! while the other is displayed, hiding reload latency as the playhead
//! approaches the edge of the active window. Driven synchronously, once per
//! playhead update: a preload begun on one update is swapped in on the next,
//! which lands the swap one rendering frame after the trigger.

use super::window::{compute_window, BufferSlot, BufferWindow};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Playhead jumps larger than this are treated as discontinuous navigation
/// (timeline click, skip button) and recenter immediately. Smaller deltas are
/// smooth 1x-16x playback advance. Tunable; changing it changes observable
/// swap behavior.
pub const LARGE_JUMP_THRESHOLD_MS: i64 = 5_000;

/// Fraction of the zoom duration from either active-window edge at which the
/// inactive buffer starts preloading.
pub const EDGE_MARGIN_RATIO: f64 = 0.3;

/// Outcome of a single playhead update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUpdate {
    /// Playhead stayed well inside the active window
    None,
    /// Discontinuous navigation: the active window recentered in place
    Jumped,
    /// The inactive buffer began preloading around the incoming time
    PreloadStarted,
    /// The preloaded buffer became active
    Swapped,
}

/// Stateful A/B buffer controller
///
/// The active window always spans 3x the zoom duration centered on
/// `center`; the playhead lies inside it except during the single update in
/// which a swap completes.
pub struct DoubleBufferController {
    zoom_duration_ms: i64,
    active: BufferSlot,
    center: DateTime<Utc>,
    /// Previous playhead position; jump detection compares against this, not
    /// the window center, so smooth playback far from center stays smooth.
    playhead: DateTime<Utc>,
    next_center: Option<DateTime<Utc>>,
    preloading: bool,
}

impl DoubleBufferController {
    /// Create a controller centered on `start_time` at the given zoom
    pub fn new(start_time: DateTime<Utc>, zoom_duration_ms: i64) -> Self {
        Self {
            zoom_duration_ms,
            active: BufferSlot::A,
            center: start_time,
            playhead: start_time,
            next_center: None,
            preloading: false,
        }
    }

    /// The currently rendered window
    pub fn active_window(&self) -> BufferWindow {
        compute_window(self.center, self.zoom_duration_ms, self.active)
    }

    /// The window being preloaded into the inactive slot, if any
    pub fn preload_window(&self) -> Option<BufferWindow> {
        self.next_center
            .map(|center| compute_window(center, self.zoom_duration_ms, self.active.other()))
    }

    /// Whether a preload is in progress
    pub fn is_preloading(&self) -> bool {
        self.preloading
    }

    /// Current zoom duration in milliseconds
    pub fn zoom_duration_ms(&self) -> i64 {
        self.zoom_duration_ms
    }

    /// Center instant of the active window
    pub fn center(&self) -> DateTime<Utc> {
        self.center
    }

    /// Feed one playhead update. Call exactly once per rendering frame.
    ///
    /// Large jumps recenter synchronously in this call; smooth advance near a
    /// window edge starts a preload which is swapped in on the next call.
    pub fn advance(&mut self, incoming: DateTime<Utc>) -> BufferUpdate {
        let jump_ms = (incoming - self.playhead).num_milliseconds().abs();
        self.playhead = incoming;

        // A preload armed on the previous frame completes first, so the swap
        // is visible exactly one frame after the trigger.
        if self.preloading {
            if let Some(next) = self.next_center.take() {
                self.active = self.active.other();
                self.center = next;
                self.preloading = false;
                debug!(
                    "Buffer swap: now active {:?} centered at {}",
                    self.active, self.center
                );
                // A discontinuous target can arrive on the swap frame itself
                if jump_ms > LARGE_JUMP_THRESHOLD_MS {
                    self.recenter(incoming);
                    return BufferUpdate::Jumped;
                }
                return BufferUpdate::Swapped;
            }
            self.preloading = false;
        }

        if jump_ms > LARGE_JUMP_THRESHOLD_MS {
            self.recenter(incoming);
            return BufferUpdate::Jumped;
        }

        if self.near_active_edge(incoming) {
            self.next_center = Some(incoming);
            self.preloading = true;
            debug!(
                "Preloading {:?} centered at {}",
                self.active.other(),
                incoming
            );
            return BufferUpdate::PreloadStarted;
        }

        BufferUpdate::None
    }

    /// Change the zoom duration, recentering on `playhead`.
    ///
    /// Zoom changes invalidate the buffer-size invariant, so any in-flight
    /// preload is cancelled and the window is rebuilt fresh.
    pub fn set_zoom(&mut self, zoom_duration_ms: i64, playhead: DateTime<Utc>) {
        self.zoom_duration_ms = zoom_duration_ms;
        self.recenter(playhead);
        debug!(
            "Zoom change: window now {}ms wide centered at {}",
            3 * zoom_duration_ms,
            playhead
        );
    }

    fn recenter(&mut self, time: DateTime<Utc>) {
        self.center = time;
        self.playhead = time;
        self.next_center = None;
        self.preloading = false;
    }

    fn near_active_edge(&self, incoming: DateTime<Utc>) -> bool {
        let window = self.active_window();
        let margin_ms = (self.zoom_duration_ms as f64 * EDGE_MARGIN_RATIO) as i64;
        let to_start = (incoming - window.start).num_milliseconds();
        let to_end = (window.end - incoming).num_milliseconds();
        to_start <= margin_ms || to_end <= margin_ms
    }
}
