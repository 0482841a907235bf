//! WebRTC-backed media session
//!
//! Production [`MediaSession`] over `webrtc::RTCPeerConnection`. The session
//! answers a remote offer (the backend always offers), forwards inbound
//! tracks to the [`MediaSink`], and surfaces ICE/peer state to the engine.
//! Local candidates discovered before the engine registers its forwarder are
//! queued and flushed on registration, so none is lost to setup ordering.

use crate::config::PlaybackConfig;
use crate::media::{
    CandidateCallback, MediaSession, MediaSessionFactory, MediaSink, MediaStats,
    PeerSessionState, PeerStateCallback, RemoteTrack,
};
use crate::signaling::IceCandidate;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;

struct Shared {
    state: parking_lot::RwLock<PeerSessionState>,
    state_callback: parking_lot::Mutex<Option<PeerStateCallback>>,
    candidate_callback: parking_lot::Mutex<Option<CandidateCallback>>,
    /// Local candidates discovered before the forwarder was registered
    pending_candidates: parking_lot::Mutex<Vec<IceCandidate>>,
}

impl Shared {
    fn emit_state(&self, state: PeerSessionState) {
        *self.state.write() = state;
        if let Some(callback) = self.state_callback.lock().as_ref() {
            callback(state);
        }
    }

    fn emit_candidate(&self, candidate: IceCandidate) {
        let callback = self.candidate_callback.lock();
        match callback.as_ref() {
            Some(callback) => callback(candidate),
            None => self.pending_candidates.lock().push(candidate),
        }
    }
}

/// [`MediaSession`] over a real peer connection
pub struct WebRtcMediaSession {
    /// Local identifier for log correlation
    connection_id: String,
    peer_connection: Arc<RTCPeerConnection>,
    command_channel: parking_lot::Mutex<Option<Arc<RTCDataChannel>>>,
    shared: Arc<Shared>,
}

impl WebRtcMediaSession {
    /// Build a peer connection with default codecs and interceptors and wire
    /// its track/ICE/state handlers. Inbound tracks go straight to `sink`.
    pub async fn new(config: &PlaybackConfig, sink: Arc<dyn MediaSink>) -> Result<Self> {
        let connection_id = uuid::Uuid::new_v4().to_string();
        info!("Creating peer connection {}", connection_id);

        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::MediaSession(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry = register_default_interceptors(Default::default(), &mut media_engine)
            .map_err(|e| Error::MediaSession(format!("Failed to register interceptors: {}", e)))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        let ice_servers: Vec<RTCIceServer> = config
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .chain(config.turn_servers.iter().map(|turn| {
                RTCIceServer {
                    urls: vec![turn.url.clone()],
                    username: turn.username.clone(),
                    credential: turn.credential.clone(),
                    ..Default::default()
                }
            }))
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| Error::MediaSession(format!("Failed to create peer connection: {}", e)))?,
        );

        let shared = Arc::new(Shared {
            state: parking_lot::RwLock::new(PeerSessionState::New),
            state_callback: parking_lot::Mutex::new(None),
            candidate_callback: parking_lot::Mutex::new(None),
            pending_candidates: parking_lot::Mutex::new(Vec::new()),
        });

        // Track delivery must be registered before any negotiation step
        let sink_clone = Arc::clone(&sink);
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let sink = Arc::clone(&sink_clone);
            Box::pin(async move {
                info!("Remote track received: {} ({})", track.id(), track.kind());
                sink.attach(RemoteTrack::from_webrtc(track));
            })
        }));

        let shared_clone = Arc::clone(&shared);
        peer_connection.on_ice_candidate(Box::new(move |candidate| {
            let shared = Arc::clone(&shared_clone);
            Box::pin(async move {
                let Some(candidate) = candidate else {
                    // End-of-candidates marker
                    return;
                };
                match candidate.to_json() {
                    Ok(init) => {
                        debug!("Local ICE candidate: {}", init.candidate);
                        shared.emit_candidate(IceCandidate {
                            sdp_mid: init.sdp_mid,
                            sdp_m_line_index: init.sdp_mline_index,
                            candidate: init.candidate,
                        });
                    }
                    Err(e) => warn!("Failed to serialize local candidate: {}", e),
                }
            })
        }));

        let shared_clone = Arc::clone(&shared);
        peer_connection.on_peer_connection_state_change(Box::new(
            move |state: RTCPeerConnectionState| {
                let shared = Arc::clone(&shared_clone);
                Box::pin(async move {
                    debug!("Peer connection state: {}", state);
                    let mapped = match state {
                        RTCPeerConnectionState::New => PeerSessionState::New,
                        RTCPeerConnectionState::Connecting => PeerSessionState::Connecting,
                        RTCPeerConnectionState::Connected => PeerSessionState::Connected,
                        RTCPeerConnectionState::Disconnected => PeerSessionState::Disconnected,
                        RTCPeerConnectionState::Failed => PeerSessionState::Failed,
                        RTCPeerConnectionState::Closed => PeerSessionState::Closed,
                        RTCPeerConnectionState::Unspecified => return,
                    };
                    shared.emit_state(mapped);
                })
            },
        ));

        // ICE failure is reported separately: it usually fires before the
        // peer-level failure and carries a more actionable cause.
        let shared_clone = Arc::clone(&shared);
        peer_connection.on_ice_connection_state_change(Box::new(
            move |state: RTCIceConnectionState| {
                let shared = Arc::clone(&shared_clone);
                Box::pin(async move {
                    debug!("ICE connection state: {}", state);
                    if state == RTCIceConnectionState::Failed {
                        shared.emit_state(PeerSessionState::IceFailed);
                    }
                })
            },
        ));

        Ok(Self {
            connection_id,
            peer_connection,
            command_channel: parking_lot::Mutex::new(None),
            shared,
        })
    }
}

#[async_trait]
impl MediaSession for WebRtcMediaSession {
    async fn apply_remote_offer(&self, offer_sdp: &str) -> Result<()> {
        let offer = RTCSessionDescription::offer(offer_sdp.to_string())
            .map_err(|e| Error::Negotiation(format!("Invalid remote offer: {}", e)))?;
        self.peer_connection
            .set_remote_description(offer)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set remote description: {}", e)))
    }

    async fn create_command_channel(&self, label: &str) -> Result<()> {
        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let channel = self
            .peer_connection
            .create_data_channel(label, Some(init))
            .await
            .map_err(|e| Error::DataChannel(format!("Failed to create data channel: {}", e)))?;

        let channel_label = label.to_string();
        channel.on_open(Box::new(move || {
            debug!("Data channel '{}' open", channel_label);
            Box::pin(async {})
        }));

        *self.command_channel.lock() = Some(channel);
        Ok(())
    }

    async fn create_answer(&self) -> Result<String> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to create answer: {}", e)))?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set local description: {}", e)))?;
        Ok(answer.sdp)
    }

    async fn add_remote_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: candidate.sdp_mid.clone(),
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .map_err(|e| Error::MediaSession(format!("Failed to add remote candidate: {}", e)))
    }

    async fn has_remote_description(&self) -> bool {
        self.peer_connection.remote_description().await.is_some()
    }

    fn connection_state(&self) -> PeerSessionState {
        *self.shared.state.read()
    }

    fn on_local_candidate(&self, callback: CandidateCallback) {
        // Flush anything gathered before registration, in discovery order
        let pending: Vec<IceCandidate> = self.shared.pending_candidates.lock().drain(..).collect();
        for candidate in pending {
            callback(candidate);
        }
        *self.shared.candidate_callback.lock() = Some(callback);
    }

    fn on_state_change(&self, callback: PeerStateCallback) {
        *self.shared.state_callback.lock() = Some(callback);
    }

    async fn stats(&self) -> Option<MediaStats> {
        let report = self.peer_connection.get_stats().await;
        let value = serde_json::to_value(&report.reports).ok()?;
        aggregate_inbound_stats(&value)
    }

    async fn close(&self) -> Result<()> {
        debug!("Closing peer connection {}", self.connection_id);
        *self.command_channel.lock() = None;
        self.peer_connection
            .close()
            .await
            .map_err(|e| Error::MediaSession(format!("Failed to close peer connection: {}", e)))
    }
}

/// Sum inbound RTP counters out of a serialized stats report.
///
/// The report shape varies across platform versions, so fields are looked up
/// by name in both camelCase and snake_case and missing ones default to zero.
fn aggregate_inbound_stats(reports: &serde_json::Value) -> Option<MediaStats> {
    let entries = reports.as_object()?;

    let mut stats = MediaStats::default();
    let mut found = false;
    for entry in entries.values() {
        let Some(bytes) = field_u64(entry, "bytesReceived", "bytes_received") else {
            continue;
        };
        let Some(packets) = field_u64(entry, "packetsReceived", "packets_received") else {
            continue;
        };
        found = true;
        stats.bytes_received += bytes;
        stats.packets_received += packets;
        stats.packets_lost += field_i64(entry, "packetsLost", "packets_lost").unwrap_or(0);
        stats.jitter_secs = stats
            .jitter_secs
            .max(field_f64(entry, "jitter", "jitter").unwrap_or(0.0));
    }
    if !found {
        return None;
    }

    let total = stats.packets_received as f64 + stats.packets_lost.max(0) as f64;
    if total > 0.0 {
        stats.loss_rate = stats.packets_lost.max(0) as f64 / total;
    }
    Some(stats)
}

fn field_u64(entry: &serde_json::Value, camel: &str, snake: &str) -> Option<u64> {
    entry.get(camel).or_else(|| entry.get(snake))?.as_u64()
}

fn field_i64(entry: &serde_json::Value, camel: &str, snake: &str) -> Option<i64> {
    entry.get(camel).or_else(|| entry.get(snake))?.as_i64()
}

fn field_f64(entry: &serde_json::Value, camel: &str, snake: &str) -> Option<f64> {
    entry.get(camel).or_else(|| entry.get(snake))?.as_f64()
}

/// Factory producing one [`WebRtcMediaSession`] per playback session
pub struct WebRtcSessionFactory {
    config: PlaybackConfig,
}

impl WebRtcSessionFactory {
    /// Create a factory for the given configuration
    pub fn new(config: PlaybackConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MediaSessionFactory for WebRtcSessionFactory {
    async fn create(&self, sink: Arc<dyn MediaSink>) -> Result<Arc<dyn MediaSession>> {
        let session = WebRtcMediaSession::new(&self.config, sink).await?;
        Ok(Arc::new(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_aggregate_inbound_stats() {
        let reports = json!({
            "inbound_1": {
                "bytesReceived": 1000u64,
                "packetsReceived": 90u64,
                "packetsLost": 10i64,
                "jitter": 0.02
            },
            "candidate_pair_1": {
                "currentRoundTripTime": 0.05
            }
        });
        let stats = aggregate_inbound_stats(&reports).unwrap();
        assert_eq!(stats.bytes_received, 1000);
        assert_eq!(stats.packets_received, 90);
        assert_eq!(stats.packets_lost, 10);
        assert!((stats.loss_rate - 0.1).abs() < 1e-9);
        assert!((stats.jitter_secs - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_snake_case_fields() {
        let reports = json!({
            "inbound_1": {
                "bytes_received": 500u64,
                "packets_received": 50u64
            }
        });
        let stats = aggregate_inbound_stats(&reports).unwrap();
        assert_eq!(stats.bytes_received, 500);
        assert_eq!(stats.packets_lost, 0);
        assert_eq!(stats.loss_rate, 0.0);
    }

    #[test]
    fn test_no_inbound_entries_yields_none() {
        let reports = json!({
            "transport_1": {"bytesSent": 10u64}
        });
        assert!(aggregate_inbound_stats(&reports).is_none());
    }
}
