//! SDP offer/answer negotiation for one playback session
//!
//! Drives the fixed exchange order the backend requires: request a session
//! (offer arrives with it), apply the offer, create the command data channel
//! *before* generating the answer, then submit the answer keyed by session
//! id. Any failure aborts negotiation with a typed error; nothing here
//! retries.

use crate::media::MediaSession;
use crate::signaling::{PlaybackRequest, PlaybackStartBody, SignalingTransport};
use crate::{Error, Result};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Label of the playback command data channel
pub const COMMAND_CHANNEL_LABEL: &str = "command";

/// Outcome of a successful negotiation
#[derive(Debug, Clone)]
pub struct NegotiatedSession {
    /// Server-assigned session identifier
    pub session_id: String,
}

/// SDP wire payloads arrive JSON-encoded: either a bare JSON string or a
/// `{type, sdp}` description object.
#[derive(Debug, Deserialize)]
struct SdpDescription {
    sdp: String,
}

/// Decode a JSON-encoded SDP payload
pub(crate) fn decode_sdp(wire: &str) -> Result<String> {
    if let Ok(sdp) = serde_json::from_str::<String>(wire) {
        return Ok(sdp);
    }
    if let Ok(desc) = serde_json::from_str::<SdpDescription>(wire) {
        return Ok(desc.sdp);
    }
    // Tolerate a server that sends the SDP un-encoded
    if wire.starts_with("v=0") {
        return Ok(wire.to_string());
    }
    Err(Error::Negotiation(format!(
        "Malformed SDP payload ({} bytes)",
        wire.len()
    )))
}

/// Encode an SDP string for the wire
pub(crate) fn encode_sdp(sdp: &str) -> Result<String> {
    serde_json::to_string(sdp).map_err(|e| Error::Negotiation(format!("SDP encode failed: {}", e)))
}

/// Orchestrates the SDP exchange for one session
pub struct SessionNegotiator {
    signaling: Arc<dyn SignalingTransport>,
    media: Arc<dyn MediaSession>,
}

impl SessionNegotiator {
    /// Create a negotiator over an already-constructed media session.
    ///
    /// The media session registers its inbound-track delivery at
    /// construction, so by the time `negotiate` runs no frame can be missed.
    pub fn new(signaling: Arc<dyn SignalingTransport>, media: Arc<dyn MediaSession>) -> Self {
        Self { signaling, media }
    }

    /// Run the full offer/answer exchange
    pub async fn negotiate(&self, request: &PlaybackRequest) -> Result<NegotiatedSession> {
        info!(
            "Negotiating playback session for camera {} at {}",
            request.camera_id, request.playback_time
        );

        let response = self
            .signaling
            .start_playback(&request.camera_id, &PlaybackStartBody::from(request))
            .await?;

        debug!(
            "Received offer for session {} ({} bytes)",
            response.session_id,
            response.offer_sdp.len()
        );

        let offer = decode_sdp(&response.offer_sdp)?;
        self.media.apply_remote_offer(&offer).await?;

        // The remote peer requires the command channel to be present in the
        // answer SDP, so it must exist before the answer is generated.
        self.media
            .create_command_channel(COMMAND_CHANNEL_LABEL)
            .await?;

        let answer = self.media.create_answer().await?;
        self.signaling
            .submit_answer(&response.session_id, &encode_sdp(&answer)?)
            .await?;

        info!("Answer submitted for session {}", response.session_id);

        Ok(NegotiatedSession {
            session_id: response.session_id,
        })
    }
}
