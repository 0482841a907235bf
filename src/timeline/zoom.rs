//! Fixed zoom level table for the timeline
//!
//! Each zoom level selects the visible time-span and the tick granularity
//! used when rendering. Levels are ordered from 1 minute to 1 week; zoom
//! operations move by index into this table.

/// One entry in the zoom table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLevel {
    /// Visible duration of the timeline in seconds
    pub duration_secs: i64,
    /// Interval between major (labeled) tick marks in milliseconds
    pub major_tick_interval_ms: i64,
    /// Interval between minor tick marks in milliseconds
    pub minor_tick_interval_ms: i64,
    /// Display label ("1 min", "1 hr", ...)
    pub label: &'static str,
}

impl ZoomLevel {
    /// Visible duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        self.duration_secs * 1000
    }
}

/// Ordered zoom table, narrowest first
pub const ZOOM_LEVELS: &[ZoomLevel] = &[
    ZoomLevel {
        duration_secs: 60,
        major_tick_interval_ms: 10_000,
        minor_tick_interval_ms: 1_000,
        label: "1 min",
    },
    ZoomLevel {
        duration_secs: 5 * 60,
        major_tick_interval_ms: 60_000,
        minor_tick_interval_ms: 10_000,
        label: "5 min",
    },
    ZoomLevel {
        duration_secs: 15 * 60,
        major_tick_interval_ms: 180_000,
        minor_tick_interval_ms: 30_000,
        label: "15 min",
    },
    ZoomLevel {
        duration_secs: 3600,
        major_tick_interval_ms: 600_000,
        minor_tick_interval_ms: 120_000,
        label: "1 hr",
    },
    ZoomLevel {
        duration_secs: 6 * 3600,
        major_tick_interval_ms: 3_600_000,
        minor_tick_interval_ms: 600_000,
        label: "6 hr",
    },
    ZoomLevel {
        duration_secs: 24 * 3600,
        major_tick_interval_ms: 14_400_000,
        minor_tick_interval_ms: 3_600_000,
        label: "24 hr",
    },
    ZoomLevel {
        duration_secs: 7 * 24 * 3600,
        major_tick_interval_ms: 86_400_000,
        minor_tick_interval_ms: 21_600_000,
        label: "1 wk",
    },
];

/// Look up a zoom level by index, clamped into the table
pub fn zoom_level(index: usize) -> &'static ZoomLevel {
    let clamped = index.min(ZOOM_LEVELS.len() - 1);
    &ZOOM_LEVELS[clamped]
}
