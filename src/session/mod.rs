//! Session lifecycle: negotiation, connection state, and the controller
//!
//! [`negotiator`] runs the SDP exchange, [`state`] tracks one connection's
//! lifecycle (timeouts, statistics, failure surfacing), and [`controller`]
//! is the per-cell entry point that ties them to the timeline model.

pub mod controller;
pub mod negotiator;
pub mod state;

pub use controller::{PlaybackSessionController, DEFAULT_ZOOM_INDEX};
pub use negotiator::{NegotiatedSession, SessionNegotiator, COMMAND_CHANNEL_LABEL};
pub use state::{ConnectionState, ConnectionStateMachine, StateCallback};
