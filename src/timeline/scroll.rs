//! Scroll offset computation
//!
//! Maps the playhead's position inside the buffer window to a pixel
//! transform that keeps the playhead centered in the viewport. Clamped so
//! the content can never scroll past either buffer edge.

use super::window::BufferWindow;
use chrono::{DateTime, Utc};

/// Compute the clamped pixel offset for the timeline content.
///
/// `elapsed / span` gives the playhead's fractional position inside the
/// window; the raw offset places that point at the viewport center. The
/// result is clamped to `[viewport/2 - content, viewport/2]`.
///
/// Deterministic and pure; recomputed on every playhead, window, or
/// viewport change.
pub fn compute_offset(
    window: &BufferWindow,
    viewport_width_px: f64,
    content_width_px: f64,
    playhead: DateTime<Utc>,
) -> f64 {
    let span_ms = window.span_ms();
    let half_viewport = viewport_width_px / 2.0;

    let min = half_viewport - content_width_px;
    let max = half_viewport;

    if span_ms <= 0 || content_width_px <= 0.0 {
        return max.min(0.0).max(min);
    }

    let elapsed_ms = (playhead - window.start).num_milliseconds() as f64;
    let percent = elapsed_ms / span_ms as f64;
    let target_px = percent * content_width_px;

    (half_viewport - target_px).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::window::{compute_window, BufferSlot};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn window() -> BufferWindow {
        // 1 hr zoom -> 3 hr window
        compute_window(t0(), 3_600_000, BufferSlot::A)
    }

    #[test]
    fn test_playhead_at_center_is_centered() {
        // Playhead at window midpoint: half the content sits left of center
        let offset = compute_offset(&window(), 800.0, 3000.0, t0());
        assert!((offset - (400.0 - 1500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_playhead_at_start_clamps_high() {
        let w = window();
        let offset = compute_offset(&w, 800.0, 3000.0, w.start);
        assert_eq!(offset, 400.0);
    }

    #[test]
    fn test_playhead_at_end_clamps_low() {
        let w = window();
        let offset = compute_offset(&w, 800.0, 3000.0, w.end);
        assert_eq!(offset, 400.0 - 3000.0);
    }

    #[test]
    fn test_never_outside_clamp_range() {
        let w = window();
        let viewport = 1024.0;
        let content = 4096.0;
        let min = viewport / 2.0 - content;
        let max = viewport / 2.0;

        // Sweep a range wider than the window itself
        for minutes in -240..240 {
            let playhead = t0() + Duration::minutes(minutes);
            let offset = compute_offset(&w, viewport, content, playhead);
            assert!(offset >= min && offset <= max, "offset {} out of range", offset);
        }
    }

    #[test]
    fn test_monotonic_in_playhead() {
        let w = window();
        let mut last = f64::INFINITY;
        for minutes in 0..180 {
            let playhead = w.start + Duration::minutes(minutes);
            let offset = compute_offset(&w, 800.0, 3000.0, playhead);
            assert!(offset <= last);
            last = offset;
        }
    }

    #[test]
    fn test_degenerate_content_width() {
        let offset = compute_offset(&window(), 800.0, 0.0, t0());
        assert!(offset.is_finite());
    }
}
