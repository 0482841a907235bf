//! HTTP/REST signaling client
//!
//! Implements [`SignalingTransport`] against the playback backend's JSON
//! endpoints. Fetch-level failures (DNS, connection refused, request
//! timeout) are remapped to [`Error::Network`]; non-2xx responses become
//! [`Error::HttpStatus`] carrying the body's `error`/`message` field so the
//! state machine can surface a user-facing category.

use super::{
    IceCandidate, IcePollResponse, IceSubmitBody, PlaybackStartBody, PlaybackStartResponse,
    SignalingTransport,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// HTTP signaling client for playback sessions
pub struct HttpSignalingClient {
    /// Base URL (e.g., "http://localhost:8080")
    base_url: String,

    /// Optional bearer token
    auth_token: Option<String>,

    /// Reqwest HTTP client
    client: reqwest::Client,
}

/// Error body shape returned by the backend on non-2xx
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpSignalingClient {
    /// Create a new signaling client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend base URL (http:// or https://)
    /// * `auth_token` - Optional bearer token for the signaling endpoints
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "signaling base_url must start with http:// or https://, got {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Signaling(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.header("authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    /// Send a request and map transport/status failures into the taxonomy
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::HttpStatus {
            status: status.as_u16(),
            message: extract_error_message(&body, status.as_u16()),
        })
    }
}

/// Remap reqwest failures: connectivity problems become `Network`, the rest
/// stay generic signaling errors.
fn map_transport_error(e: reqwest::Error) -> Error {
    if e.is_connect() || e.is_timeout() || e.is_request() {
        Error::Network(e.to_string())
    } else {
        Error::Signaling(e.to_string())
    }
}

/// Pull the `error`/`message` field out of an error body, falling back to
/// the raw text or the status reason.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(msg) = parsed.error.or(parsed.message) {
            return msg;
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    format!("HTTP {}", status)
}

#[async_trait]
impl SignalingTransport for HttpSignalingClient {
    async fn start_playback(
        &self,
        camera_id: &str,
        body: &PlaybackStartBody,
    ) -> Result<PlaybackStartResponse> {
        let url = format!("{}/cameras/{}/playback/start", self.base_url, camera_id);
        debug!("Requesting playback session: {}", url);

        let response = self.send(self.request(self.client.post(&url).json(body))).await?;

        response
            .json::<PlaybackStartResponse>()
            .await
            .map_err(|e| Error::Negotiation(format!("Malformed playback/start response: {}", e)))
    }

    async fn submit_answer(&self, session_id: &str, answer_sdp: &str) -> Result<()> {
        let url = format!("{}/playback/webrtc/answer", self.base_url);
        debug!("Submitting answer for session {}", session_id);

        let body = super::AnswerBody {
            session_id: session_id.to_string(),
            answer_sdp: answer_sdp.to_string(),
        };
        self.send(self.request(self.client.put(&url).json(&body))).await?;
        Ok(())
    }

    async fn send_candidate(&self, session_id: &str, candidate: &IceCandidate) -> Result<()> {
        let url = format!("{}/playback/webrtc/ice", self.base_url);

        let body = IceSubmitBody {
            session_id: session_id.to_string(),
            candidate: candidate.clone(),
        };
        self.send(self.request(self.client.post(&url).json(&body))).await?;
        Ok(())
    }

    async fn poll_candidates(&self, session_id: &str) -> Result<Vec<IceCandidate>> {
        let url = format!("{}/playback/webrtc/ice/{}", self.base_url, session_id);

        let response = self.send(self.request(self.client.get(&url))).await?;
        let parsed: IcePollResponse = response
            .json()
            .await
            .map_err(|e| Error::Signaling(format!("Malformed ICE poll response: {}", e)))?;
        Ok(parsed.candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client() {
        assert!(HttpSignalingClient::new("http://localhost:8080", None).is_ok());
        assert!(HttpSignalingClient::new("https://vms.example.com/", None).is_ok());
    }

    #[test]
    fn test_invalid_scheme_rejected() {
        assert!(HttpSignalingClient::new("ws://localhost:8080", None).is_err());
        assert!(HttpSignalingClient::new("", None).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpSignalingClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_extract_error_message_variants() {
        assert_eq!(
            extract_error_message(r#"{"error": "no recording"}"#, 404),
            "no recording"
        );
        assert_eq!(
            extract_error_message(r#"{"message": "denied"}"#, 403),
            "denied"
        );
        assert_eq!(extract_error_message("plain text", 500), "plain text");
        assert_eq!(extract_error_message("", 502), "HTTP 502");
    }
}
