//! Signaling transport for playback sessions
//!
//! The backend exposes an asymmetric exchange: session start and answer
//! submission are plain request/response, locally discovered ICE candidates
//! are pushed fire-and-forget, and remote candidates must be polled. The
//! [`SignalingTransport`] trait captures that surface; [`http`] implements
//! it over REST and [`ice`] drives the polling loop.

pub mod http;
pub mod ice;

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use http::HttpSignalingClient;
pub use ice::IceExchangeCoordinator;

/// Immutable input to one playback session
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackRequest {
    /// Camera whose recording is played back
    pub camera_id: String,
    /// Recorded-time instant to start playback at
    pub playback_time: DateTime<Utc>,
    /// Skip recording gaps instead of waiting through them
    pub skip_gaps: bool,
    /// Playback speed multiplier (1.0 to 16.0)
    pub speed: f64,
}

/// Body of `POST /cameras/{cameraId}/playback/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStartBody {
    /// ISO-8601 recorded-time start instant
    pub playback_time: DateTime<Utc>,
    /// Skip recording gaps
    pub skip_gaps: bool,
    /// Playback speed multiplier
    pub speed: f64,
}

impl From<&PlaybackRequest> for PlaybackStartBody {
    fn from(request: &PlaybackRequest) -> Self {
        Self {
            playback_time: request.playback_time,
            skip_gaps: request.skip_gaps,
            speed: request.speed,
        }
    }
}

/// Response of `POST /cameras/{cameraId}/playback/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStartResponse {
    /// Opaque server-assigned session identifier
    pub session_id: String,
    /// JSON-encoded SDP offer
    pub offer_sdp: String,
}

/// Body of `PUT /playback/webrtc/answer`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerBody {
    /// Session the answer belongs to
    pub session_id: String,
    /// JSON-encoded SDP answer
    pub answer_sdp: String,
}

/// An ICE candidate, exchanged both directions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// Media stream identification tag
    pub sdp_mid: Option<String>,
    /// Media line index
    pub sdp_m_line_index: Option<u16>,
    /// The candidate string
    pub candidate: String,
}

/// Body of `POST /playback/webrtc/ice`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceSubmitBody {
    /// Session the candidate belongs to
    pub session_id: String,
    /// Candidate payload
    pub candidate: IceCandidate,
}

/// Response of `GET /playback/webrtc/ice/{sessionId}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcePollResponse {
    /// Remote candidates gathered since the last poll (possibly empty)
    #[serde(default)]
    pub candidates: Vec<IceCandidate>,
}

/// Signaling endpoints consumed by the playback engine
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// `POST /cameras/{cameraId}/playback/start`
    async fn start_playback(
        &self,
        camera_id: &str,
        body: &PlaybackStartBody,
    ) -> Result<PlaybackStartResponse>;

    /// `PUT /playback/webrtc/answer`
    async fn submit_answer(&self, session_id: &str, answer_sdp: &str) -> Result<()>;

    /// `POST /playback/webrtc/ice` — fire-and-forget; callers log errors
    async fn send_candidate(&self, session_id: &str, candidate: &IceCandidate) -> Result<()>;

    /// `GET /playback/webrtc/ice/{sessionId}`
    async fn poll_candidates(&self, session_id: &str) -> Result<Vec<IceCandidate>>;
}
