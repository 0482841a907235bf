//! Timeline render data
//!
//! Projects the active buffer window into the data the UI layer draws: tick
//! marks aligned to the zoom level's intervals, recording-availability bars
//! clipped to the window, and the clamped scroll offset. Marks are generated
//! across the full buffer window (not just the viewport) so they stay
//! pixel-continuous across buffer swaps.

use super::scroll::compute_offset;
use super::window::BufferWindow;
use super::zoom::ZoomLevel;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A recorded interval on the camera, supplied externally and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSequence {
    /// Server-assigned sequence identifier
    pub sequence_id: String,
    /// Recording start
    pub start: DateTime<Utc>,
    /// Recording end
    pub end: DateTime<Utc>,
}

/// One tick mark on the timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickMark {
    /// Instant this mark sits on
    pub time: DateTime<Utc>,
    /// Pixel x inside the content area
    pub x_px: f64,
    /// Major (labeled) mark, as opposed to minor
    pub major: bool,
}

/// A recording-availability bar in content-pixel space
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceBar {
    /// Sequence this bar represents
    pub sequence_id: String,
    /// Left edge inside the content area
    pub left_px: f64,
    /// Bar width, always > 0
    pub width_px: f64,
}

/// Everything the UI needs to draw one frame of the timeline
#[derive(Debug, Clone)]
pub struct TimelineSnapshot {
    /// The rendered buffer window
    pub active_window: BufferWindow,
    /// Clamped content transform in pixels
    pub scroll_offset_px: f64,
    /// Tick marks across the full window
    pub tick_marks: Vec<TickMark>,
    /// Recording bars clipped to the window
    pub sequence_bars: Vec<SequenceBar>,
    /// Display label of the current zoom level
    pub zoom_label: &'static str,
}

/// Generate tick marks for `window`, aligned to the zoom level's intervals.
///
/// Minor marks that coincide with a major interval boundary are emitted as
/// major. Alignment is to interval boundaries in absolute time, so two
/// windows overlapping in time produce identical marks in the overlap.
pub fn tick_marks(window: &BufferWindow, zoom: &ZoomLevel, content_width_px: f64) -> Vec<TickMark> {
    let span_ms = window.span_ms();
    if span_ms <= 0 {
        return Vec::new();
    }
    let px_per_ms = content_width_px / span_ms as f64;
    let minor = zoom.minor_tick_interval_ms;
    let major = zoom.major_tick_interval_ms;

    let start_ms = window.start.timestamp_millis();
    let end_ms = window.end.timestamp_millis();
    let mut t = start_ms - start_ms.rem_euclid(minor);
    if t < start_ms {
        t += minor;
    }

    let mut marks = Vec::new();
    while t <= end_ms {
        let time = Utc.timestamp_millis_opt(t).single().unwrap_or(window.start);
        marks.push(TickMark {
            time,
            x_px: (t - start_ms) as f64 * px_per_ms,
            major: t.rem_euclid(major) == 0,
        });
        t += minor;
    }
    marks
}

/// Project recording sequences onto `window` in content-pixel space.
///
/// Sequences outside the window are skipped; overlapping ones are clipped to
/// the window edges. Order follows the input.
pub fn sequence_bars(
    window: &BufferWindow,
    sequences: &[RecordingSequence],
    content_width_px: f64,
) -> Vec<SequenceBar> {
    let span_ms = window.span_ms();
    if span_ms <= 0 {
        return Vec::new();
    }
    let px_per_ms = content_width_px / span_ms as f64;

    sequences
        .iter()
        .filter_map(|seq| {
            let start = seq.start.max(window.start);
            let end = seq.end.min(window.end);
            if start >= end {
                return None;
            }
            let left_ms = (start - window.start).num_milliseconds();
            let width_ms = (end - start).num_milliseconds();
            Some(SequenceBar {
                sequence_id: seq.sequence_id.clone(),
                left_px: left_ms as f64 * px_per_ms,
                width_px: width_ms as f64 * px_per_ms,
            })
        })
        .collect()
}

/// Assemble the full render snapshot for one frame
pub fn snapshot(
    window: BufferWindow,
    zoom: &ZoomLevel,
    sequences: &[RecordingSequence],
    viewport_width_px: f64,
    content_width_px: f64,
    playhead: DateTime<Utc>,
) -> TimelineSnapshot {
    TimelineSnapshot {
        scroll_offset_px: compute_offset(&window, viewport_width_px, content_width_px, playhead),
        tick_marks: tick_marks(&window, zoom, content_width_px),
        sequence_bars: sequence_bars(&window, sequences, content_width_px),
        zoom_label: zoom.label,
        active_window: window,
    }
}

/// Convenience: a sequence spanning `start..start + secs`
#[cfg(test)]
pub(crate) fn sequence(sequence_id: &str, start: DateTime<Utc>, secs: i64) -> RecordingSequence {
    RecordingSequence {
        sequence_id: sequence_id.to_string(),
        start,
        end: start + chrono::Duration::seconds(secs),
    }
}
