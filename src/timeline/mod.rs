//! Double-buffered timeline model
//!
//! Pure window/offset math plus the A/B buffer controller that keeps a
//! 3x-wide time window loaded around the playhead and swaps buffers without
//! a visible seam.

pub mod double_buffer;
pub mod render;
pub mod scroll;
pub mod window;
pub mod zoom;

pub use double_buffer::{
    BufferUpdate, DoubleBufferController, EDGE_MARGIN_RATIO, LARGE_JUMP_THRESHOLD_MS,
};
pub use render::{sequence_bars, snapshot, tick_marks, RecordingSequence, SequenceBar, TickMark, TimelineSnapshot};
pub use scroll::compute_offset;
pub use window::{compute_window, BufferSlot, BufferWindow};
pub use zoom::{zoom_level, ZoomLevel, ZOOM_LEVELS};
