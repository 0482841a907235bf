//! Shared mocks for unit tests

#![allow(missing_docs)]

use crate::config::PlaybackConfig;
use crate::media::{
    CandidateCallback, MediaSession, MediaSessionFactory, MediaSink, MediaStats,
    PeerSessionState, PeerStateCallback, RemoteTrack,
};
use crate::session::controller::PlaybackSessionController;
use crate::session::state::ConnectionState;
use crate::signaling::{
    IceCandidate, PlaybackStartBody, PlaybackStartResponse, SignalingTransport,
};
use crate::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Scripted signaling transport: counts calls, answers from a queue
#[derive(Default)]
pub struct MockSignaling {
    /// Next responses for `start_playback`, consumed front-first; an empty
    /// queue yields a generic success.
    pub start_responses: Mutex<Vec<Result<PlaybackStartResponse>>>,
    pub started: Mutex<Vec<(String, PlaybackStartBody)>>,
    pub answers: Mutex<Vec<(String, String)>>,
    pub sent_candidates: Mutex<Vec<(String, IceCandidate)>>,
    /// Remote candidates handed out on the next poll
    pub poll_queue: Mutex<Vec<IceCandidate>>,
    pub poll_count: Mutex<u32>,
}

impl MockSignaling {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn default_start_response() -> PlaybackStartResponse {
        PlaybackStartResponse {
            session_id: "mock-session".to_string(),
            offer_sdp: "\"v=0\\r\\nmock offer\"".to_string(),
        }
    }
}

#[async_trait]
impl SignalingTransport for MockSignaling {
    async fn start_playback(
        &self,
        camera_id: &str,
        body: &PlaybackStartBody,
    ) -> Result<PlaybackStartResponse> {
        self.started
            .lock()
            .push((camera_id.to_string(), body.clone()));
        let mut queue = self.start_responses.lock();
        if queue.is_empty() {
            Ok(Self::default_start_response())
        } else {
            queue.remove(0)
        }
    }

    async fn submit_answer(&self, session_id: &str, answer_sdp: &str) -> Result<()> {
        self.answers
            .lock()
            .push((session_id.to_string(), answer_sdp.to_string()));
        Ok(())
    }

    async fn send_candidate(&self, session_id: &str, candidate: &IceCandidate) -> Result<()> {
        self.sent_candidates
            .lock()
            .push((session_id.to_string(), candidate.clone()));
        Ok(())
    }

    async fn poll_candidates(&self, _session_id: &str) -> Result<Vec<IceCandidate>> {
        *self.poll_count.lock() += 1;
        Ok(self.poll_queue.lock().drain(..).collect())
    }
}

/// Drivable media session: tests trigger peer state changes by hand
pub struct MockMediaSession {
    pub state: Mutex<PeerSessionState>,
    pub state_callback: Mutex<Option<PeerStateCallback>>,
    pub candidate_callback: Mutex<Option<CandidateCallback>>,
    pub remote_candidates: Mutex<Vec<IceCandidate>>,
    pub closed: Mutex<bool>,
    pub stats: Mutex<Option<MediaStats>>,
}

impl MockMediaSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PeerSessionState::New),
            state_callback: Mutex::new(None),
            candidate_callback: Mutex::new(None),
            remote_candidates: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
            stats: Mutex::new(None),
        })
    }

    /// Drive a peer state change through the registered callback
    pub fn drive_state(&self, state: PeerSessionState) {
        *self.state.lock() = state;
        if let Some(callback) = self.state_callback.lock().as_ref() {
            callback(state);
        }
    }

    /// Emit a locally discovered candidate
    pub fn discover_candidate(&self, candidate: IceCandidate) {
        if let Some(callback) = self.candidate_callback.lock().as_ref() {
            callback(candidate);
        }
    }
}

#[async_trait]
impl MediaSession for MockMediaSession {
    async fn apply_remote_offer(&self, _offer_sdp: &str) -> Result<()> {
        Ok(())
    }

    async fn create_command_channel(&self, _label: &str) -> Result<()> {
        Ok(())
    }

    async fn create_answer(&self) -> Result<String> {
        Ok("v=0\r\nmock answer".to_string())
    }

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.remote_candidates.lock().push(candidate.clone());
        Ok(())
    }

    async fn has_remote_description(&self) -> bool {
        true
    }

    fn connection_state(&self) -> PeerSessionState {
        *self.state.lock()
    }

    fn on_local_candidate(&self, callback: CandidateCallback) {
        *self.candidate_callback.lock() = Some(callback);
    }

    fn on_state_change(&self, callback: PeerStateCallback) {
        *self.state_callback.lock() = Some(callback);
    }

    async fn stats(&self) -> Option<MediaStats> {
        *self.stats.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.closed.lock() = true;
        *self.state.lock() = PeerSessionState::Closed;
        Ok(())
    }
}

/// Factory handing out pre-built mock sessions in order
pub struct MockMediaFactory {
    pub sessions: Mutex<Vec<Arc<MockMediaSession>>>,
    pub created: Mutex<Vec<Arc<MockMediaSession>>>,
}

impl MockMediaFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        })
    }

    /// The most recently created session
    pub fn last(&self) -> Option<Arc<MockMediaSession>> {
        self.created.lock().last().cloned()
    }
}

#[async_trait]
impl MediaSessionFactory for MockMediaFactory {
    async fn create(&self, _sink: Arc<dyn MediaSink>) -> Result<Arc<dyn MediaSession>> {
        let session = {
            let mut queue = self.sessions.lock();
            if queue.is_empty() {
                MockMediaSession::new()
            } else {
                queue.remove(0)
            }
        };
        self.created.lock().push(Arc::clone(&session));
        Ok(session)
    }
}

/// Sink recording every attached track id
#[derive(Default)]
pub struct RecordingSink {
    pub tracks: Mutex<Vec<String>>,
}

impl MediaSink for RecordingSink {
    fn attach(&self, track: RemoteTrack) {
        self.tracks.lock().push(track.id);
    }
}

/// Fully mocked controller wiring plus the observed state transitions
pub struct Harness {
    pub config: PlaybackConfig,
    pub signaling: Arc<MockSignaling>,
    pub factory: Arc<MockMediaFactory>,
    pub sink: Arc<RecordingSink>,
    pub transitions: Arc<Mutex<Vec<(ConnectionState, Option<String>)>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            config: PlaybackConfig::default(),
            signaling: MockSignaling::new(),
            factory: MockMediaFactory::new(),
            sink: Arc::new(RecordingSink::default()),
            transitions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn controller(&self) -> PlaybackSessionController {
        let transitions = Arc::clone(&self.transitions);
        PlaybackSessionController::with_transports(
            self.config.clone(),
            self.signaling.clone(),
            self.factory.clone(),
            self.sink.clone(),
            Arc::new(move |state, message| {
                transitions.lock().push((state, message));
            }),
        )
    }

    /// States observed so far, without messages
    pub fn states(&self) -> Vec<ConnectionState> {
        self.transitions.lock().iter().map(|(s, _)| *s).collect()
    }
}
