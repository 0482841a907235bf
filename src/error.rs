//! Error types for the playback engine

/// Result type alias using playback Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in playback session operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// SDP negotiation failed (signaling request failed or malformed SDP)
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    /// Connecting state exceeded the connect timeout
    #[error("Connection timeout after {0}s")]
    ConnectTimeout(u64),

    /// ICE transport reported failure
    #[error("ICE connection failed: {0}")]
    IceFailure(String),

    /// Fetch-level failure (DNS, connection refused, request timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from a signaling endpoint
    #[error("Signaling endpoint returned HTTP {status}: {message}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Error body text (`error`/`message` field or raw body)
        message: String,
    },

    /// Signaling transport error that is not an HTTP status
    #[error("Signaling error: {0}")]
    Signaling(String),

    /// A session is already active for this cell
    #[error("Session already active: {0}")]
    SessionActive(String),

    /// Media session (peer connection) error
    #[error("Media session error: {0}")]
    MediaSession(String),

    /// Data channel error
    #[error("Data channel error: {0}")]
    DataChannel(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// User-facing message for surfacing through the state callback.
    ///
    /// HTTP statuses map to operator-friendly categories; everything else
    /// keeps its display form.
    pub fn user_message(&self) -> String {
        match self {
            Error::HttpStatus { status: 404, .. } => {
                "No recording available at this time".to_string()
            }
            Error::HttpStatus { status: 401 | 403, .. } => "Authentication required".to_string(),
            Error::HttpStatus { status, message } if *status >= 500 => {
                format!("Playback service error ({}): {}", status, message)
            }
            Error::Network(_) => "Cannot reach the playback service — check your connection"
                .to_string(),
            Error::IceFailure(_) => {
                "Media connection failed — check firewall/network settings".to_string()
            }
            Error::ConnectTimeout(secs) => {
                format!("Connection timed out after {}s", secs)
            }
            other => other.to_string(),
        }
    }

    /// Check if this error came from the signaling transport
    pub fn is_signaling_error(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::HttpStatus { .. } | Error::Signaling(_)
        )
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}
