//! Media session and sink abstractions
//!
//! The engine never touches a peer connection or a renderer directly. It
//! drives a [`MediaSession`] (SDP/ICE/data-channel surface of one peer
//! connection) and hands inbound streams to a [`MediaSink`]. Any
//! implementation can satisfy these: the production one in
//! [`crate::webrtc_session`] wraps `webrtc::RTCPeerConnection`; tests use
//! scripted mocks.

use crate::signaling::IceCandidate;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle of the underlying peer connection, as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSessionState {
    /// Created, negotiation not finished
    New,
    /// Transport negotiation in progress
    Connecting,
    /// Media is flowing
    Connected,
    /// Previously connected, transport lost
    Disconnected,
    /// Peer connection failed
    Failed,
    /// ICE specifically reported failure (more actionable than `Failed`)
    IceFailed,
    /// Closed locally
    Closed,
}

/// Inbound media stream handed to the sink
#[derive(Clone)]
pub struct RemoteTrack {
    /// Track identifier
    pub id: String,
    /// Track kind ("audio"/"video")
    pub kind: String,
    /// Underlying WebRTC track, when the session is WebRTC-backed
    inner: Option<Arc<webrtc::track::track_remote::TrackRemote>>,
}

impl RemoteTrack {
    /// Build a track handle around a WebRTC remote track
    pub fn from_webrtc(track: Arc<webrtc::track::track_remote::TrackRemote>) -> Self {
        Self {
            id: track.id(),
            kind: track.kind().to_string(),
            inner: Some(track),
        }
    }

    /// Build a detached handle (mocks, tests)
    pub fn detached(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            inner: None,
        }
    }

    /// The underlying WebRTC track, if any
    pub fn webrtc_track(&self) -> Option<&Arc<webrtc::track::track_remote::TrackRemote>> {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Connection statistics sampled for observability
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaStats {
    /// Total bytes received
    pub bytes_received: u64,
    /// Total packets received
    pub packets_received: u64,
    /// Total packets lost
    pub packets_lost: i64,
    /// Jitter in seconds
    pub jitter_secs: f64,
    /// Estimated loss rate (0.0 to 1.0)
    pub loss_rate: f64,
}

/// Callback for locally discovered ICE candidates
pub type CandidateCallback = Box<dyn Fn(IceCandidate) + Send + Sync>;

/// Callback for peer connection state changes
pub type PeerStateCallback = Box<dyn Fn(PeerSessionState) + Send + Sync>;

/// Render sink for inbound media
///
/// The engine only hands the stream reference over; playback/rendering is
/// entirely the sink's concern.
pub trait MediaSink: Send + Sync {
    /// Attach an inbound stream for playback
    fn attach(&self, track: RemoteTrack);
}

/// One peer connection's negotiation surface
///
/// Implementations must register their inbound-track delivery to the sink at
/// construction time, before any negotiation step, so no frame can be missed
/// once negotiation completes.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Apply the remote offer as the connection's remote description
    async fn apply_remote_offer(&self, offer_sdp: &str) -> Result<()>;

    /// Create a data channel for playback commands.
    ///
    /// Must be called before [`create_answer`](Self::create_answer); the
    /// remote signaling peer requires the channel to be in the answer SDP.
    async fn create_command_channel(&self, label: &str) -> Result<()>;

    /// Generate the local answer and apply it as the local description
    async fn create_answer(&self) -> Result<String>;

    /// Apply a remote ICE candidate
    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<()>;

    /// Whether a remote description has been applied yet
    async fn has_remote_description(&self) -> bool;

    /// Current connection state
    fn connection_state(&self) -> PeerSessionState;

    /// Register the local-candidate callback (fire-and-forget sends)
    fn on_local_candidate(&self, callback: CandidateCallback);

    /// Register the state-change callback
    fn on_state_change(&self, callback: PeerStateCallback);

    /// Sample connection statistics. Telemetry only: `None` means the
    /// platform had nothing to report, never an error.
    async fn stats(&self) -> Option<MediaStats>;

    /// Close the connection and release the media sink binding
    async fn close(&self) -> Result<()>;
}

/// Factory for media sessions, one per playback session
#[async_trait]
pub trait MediaSessionFactory: Send + Sync {
    /// Create a session whose inbound tracks are delivered to `sink`
    async fn create(&self, sink: Arc<dyn MediaSink>) -> Result<Arc<dyn MediaSession>>;
}

/// A sink that drops every stream; useful for probing sessions without a
/// renderer attached
pub struct NullSink;

impl MediaSink for NullSink {
    fn attach(&self, track: RemoteTrack) {
        tracing::debug!("NullSink dropping track {} ({})", track.id, track.kind);
    }
}
