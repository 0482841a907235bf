//! ICE candidate exchange
//!
//! The transport is asymmetric: local candidates are pushed as the platform
//! discovers them, remote candidates must be polled. The coordinator sends
//! local candidates fire-and-forget and owns a single polling task with
//! adaptive backoff, which stops once the connection is established or the
//! session is torn down.

use super::{IceCandidate, SignalingTransport};
use crate::media::{MediaSession, PeerSessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of one remote-candidate poll, for backoff computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Poll returned at least one candidate
    Progress,
    /// Poll returned zero candidates
    Empty,
    /// Poll failed
    Error,
}

/// Compute the next poll interval from the previous one.
///
/// Progress resets to the initial interval; empty polls grow the interval by
/// 1.5x, errors by 2x, both capped at `max`.
pub fn next_interval(
    previous: Duration,
    outcome: PollOutcome,
    initial: Duration,
    max: Duration,
) -> Duration {
    match outcome {
        PollOutcome::Progress => initial,
        PollOutcome::Empty => (previous * 3 / 2).min(max),
        PollOutcome::Error => (previous * 2).min(max),
    }
}

/// Bidirectional ICE candidate exchange for one session
pub struct IceExchangeCoordinator {
    session_id: String,
    signaling: Arc<dyn SignalingTransport>,
    media: Arc<dyn MediaSession>,
    initial_interval: Duration,
    max_interval: Duration,
    poll_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl IceExchangeCoordinator {
    /// Create a coordinator for `session_id`
    pub fn new(
        session_id: String,
        signaling: Arc<dyn SignalingTransport>,
        media: Arc<dyn MediaSession>,
        initial_interval: Duration,
        max_interval: Duration,
    ) -> Self {
        Self {
            session_id,
            signaling,
            media,
            initial_interval,
            max_interval,
            poll_task: parking_lot::Mutex::new(None),
        }
    }

    /// Begin candidate exchange.
    ///
    /// Registers the local-candidate forwarder and spawns the remote polling
    /// loop. Idempotent: a second call does nothing while the loop runs.
    pub fn start(&self) {
        let mut guard = self.poll_task.lock();
        if guard.is_some() {
            return;
        }

        self.register_local_forwarder();

        let session_id = self.session_id.clone();
        let signaling = Arc::clone(&self.signaling);
        let media = Arc::clone(&self.media);
        let initial = self.initial_interval;
        let max = self.max_interval;

        *guard = Some(tokio::spawn(async move {
            let mut interval = initial;
            // Candidates polled before the remote description is set are held
            // here and re-applied on the next iteration, never dropped.
            let mut pending: Vec<IceCandidate> = Vec::new();

            loop {
                tokio::time::sleep(interval).await;

                match media.connection_state() {
                    PeerSessionState::Connected
                    | PeerSessionState::Closed
                    | PeerSessionState::Failed => {
                        debug!("ICE polling stopped for session {}", session_id);
                        break;
                    }
                    _ => {}
                }

                let outcome = match signaling.poll_candidates(&session_id).await {
                    Ok(candidates) if candidates.is_empty() && pending.is_empty() => {
                        PollOutcome::Empty
                    }
                    Ok(candidates) => {
                        pending.extend(candidates);
                        if media.has_remote_description().await {
                            for candidate in pending.drain(..) {
                                if let Err(e) = media.add_remote_candidate(&candidate).await {
                                    warn!(
                                        "Failed to apply remote candidate for session {}: {}",
                                        session_id, e
                                    );
                                }
                            }
                        } else {
                            debug!(
                                "Holding {} candidate(s) until remote description is set",
                                pending.len()
                            );
                        }
                        PollOutcome::Progress
                    }
                    Err(e) => {
                        warn!("ICE poll failed for session {}: {}", session_id, e);
                        PollOutcome::Error
                    }
                };

                interval = next_interval(interval, outcome, initial, max);
            }
        }));
    }

    /// Stop polling. Safe to call multiple times or before `start`.
    pub fn stop(&self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
            debug!("ICE poll task aborted for session {}", self.session_id);
        }
    }

    /// Forward locally discovered candidates to the backend, fire-and-forget
    fn register_local_forwarder(&self) {
        let session_id = self.session_id.clone();
        let signaling = Arc::clone(&self.signaling);

        self.media.on_local_candidate(Box::new(move |candidate| {
            let session_id = session_id.clone();
            let signaling = Arc::clone(&signaling);
            tokio::spawn(async move {
                if let Err(e) = signaling.send_candidate(&session_id, &candidate).await {
                    // A single lost candidate does not fail the session
                    warn!(
                        "Failed to send local candidate for session {}: {}",
                        session_id, e
                    );
                }
            });
        }));
    }
}

impl Drop for IceExchangeCoordinator {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.lock().take() {
            task.abort();
        }
    }
}
