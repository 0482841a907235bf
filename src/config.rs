//! Configuration types for the playback engine

use serde::{Deserialize, Serialize};

/// Main configuration for a playback session controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Signaling base URL (http:// or https://)
    pub signaling_base_url: String,

    /// Optional bearer token for the signaling endpoints
    pub auth_token: Option<String>,

    /// STUN server URLs (at least one required)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Connect timeout in seconds (default: 30)
    pub connect_timeout_secs: u64,

    /// Statistics sampling interval in seconds (default: 10, 0 disables)
    pub stats_interval_secs: u64,

    /// Seek debounce window in milliseconds (default: 500)
    pub seek_debounce_ms: u64,

    /// Initial ICE poll interval in milliseconds (default: 500)
    pub ice_poll_initial_ms: u64,

    /// Maximum ICE poll interval in milliseconds (default: 5000)
    pub ice_poll_max_ms: u64,
}

/// TURN server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn:// or turns://)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            signaling_base_url: "http://localhost:8080".to_string(),
            auth_token: None,
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            turn_servers: Vec::new(),
            connect_timeout_secs: 30,
            stats_interval_secs: 10,
            seek_debounce_ms: 500,
            ice_poll_initial_ms: 500,
            ice_poll_max_ms: 5000,
        }
    }
}

impl PlaybackConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_base_url` is not an HTTP(S) URL
    /// - `stun_servers` is empty
    /// - `connect_timeout_secs` is zero
    /// - `ice_poll_initial_ms` is zero or greater than `ice_poll_max_ms`
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.signaling_base_url.starts_with("http://")
            && !self.signaling_base_url.starts_with("https://")
        {
            return Err(Error::InvalidConfig(format!(
                "signaling_base_url must start with http:// or https://, got {}",
                self.signaling_base_url
            )));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(Error::InvalidConfig(
                "connect_timeout_secs must be non-zero".to_string(),
            ));
        }

        if self.ice_poll_initial_ms == 0 {
            return Err(Error::InvalidConfig(
                "ice_poll_initial_ms must be non-zero".to_string(),
            ));
        }

        if self.ice_poll_initial_ms > self.ice_poll_max_ms {
            return Err(Error::InvalidConfig(format!(
                "ice_poll_initial_ms ({}) must not exceed ice_poll_max_ms ({})",
                self.ice_poll_initial_ms, self.ice_poll_max_ms
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_fails() {
        let mut config = PlaybackConfig::default();
        config.signaling_base_url = "ws://localhost:8080".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_stun_servers_fails() {
        let mut config = PlaybackConfig::default();
        config.stun_servers.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_fails() {
        let mut config = PlaybackConfig::default();
        config.connect_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poll_interval_ordering() {
        let mut config = PlaybackConfig::default();
        config.ice_poll_initial_ms = 6000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = PlaybackConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PlaybackConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.signaling_base_url, deserialized.signaling_base_url);
    }
}
