//! Buffer window computation
//!
//! A buffer window is the time range loaded for rendering the timeline:
//! 3x the visible zoom duration, centered on a reference instant, so the
//! content around the playhead is always ready before it scrolls into view.

use chrono::{DateTime, Duration, Utc};

/// Identifier for one of the two alternating buffer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSlot {
    /// Slot A
    A,
    /// Slot B
    B,
}

impl BufferSlot {
    /// The other slot
    pub fn other(self) -> Self {
        match self {
            BufferSlot::A => BufferSlot::B,
            BufferSlot::B => BufferSlot::A,
        }
    }
}

/// A loaded time range, 3x the visible zoom duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferWindow {
    /// Window start
    pub start: DateTime<Utc>,
    /// Window end
    pub end: DateTime<Utc>,
    /// Which slot holds this window
    pub slot: BufferSlot,
}

impl BufferWindow {
    /// Window span in milliseconds
    pub fn span_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    /// Whether `time` lies inside the window (exclusive of the end edge)
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time < self.end
    }
}

/// Compute a buffer window centered on `center`.
///
/// The margin on each side is 1.5x the zoom duration, so the full window is
/// 3x the visible duration. Pure and total: always returns a valid window.
pub fn compute_window(
    center: DateTime<Utc>,
    zoom_duration_ms: i64,
    slot: BufferSlot,
) -> BufferWindow {
    let margin = Duration::milliseconds(zoom_duration_ms * 3 / 2);
    BufferWindow {
        start: center - margin,
        end: center + margin,
        slot,
    }
}
