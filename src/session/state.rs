//! Connection lifecycle state machine
//!
//! Wraps one session's negotiation and connection tracking: Idle →
//! Connecting → {Connected | Failed}, Connected → {Disconnected | Failed}.
//! Owns the connect timeout and the periodic statistics sampler, and is the
//! single source of truth for "is connected yet". Failures never cross the
//! public API as errors; they surface through the state callback.

use crate::config::PlaybackConfig;
use crate::media::{MediaSession, MediaSessionFactory, MediaSink, MediaStats, PeerSessionState};
use crate::session::negotiator::SessionNegotiator;
use crate::signaling::{IceExchangeCoordinator, PlaybackRequest, SignalingTransport};
use crate::{Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Session lifecycle state exposed to the UI layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session
    Idle,
    /// Negotiation and transport setup in progress
    Connecting,
    /// Media is flowing
    Connected,
    /// Session failed (error message delivered with the transition)
    Failed,
    /// Previously connected session lost its transport
    Disconnected,
}

/// Notification for every state transition; the message is set for `Failed`
pub type StateCallback = Arc<dyn Fn(ConnectionState, Option<String>) + Send + Sync>;

struct ActiveSession {
    session_id: Option<String>,
    media: Arc<dyn MediaSession>,
    ice: Option<Arc<IceExchangeCoordinator>>,
    timeout_task: Option<JoinHandle<()>>,
    stats_task: Option<JoinHandle<()>>,
    negotiation_task: Option<JoinHandle<()>>,
}

struct Inner {
    state: parking_lot::RwLock<ConnectionState>,
    /// Bumped on every `start`/`shutdown`; late callbacks and timer fires
    /// from a superseded session compare against it and bail.
    generation: AtomicU64,
    session: parking_lot::Mutex<Option<ActiveSession>>,
    last_stats: parking_lot::Mutex<Option<MediaStats>>,
    callback: StateCallback,
}

/// State machine for one playback connection
pub struct ConnectionStateMachine {
    config: PlaybackConfig,
    signaling: Arc<dyn SignalingTransport>,
    factory: Arc<dyn MediaSessionFactory>,
    sink: Arc<dyn MediaSink>,
    inner: Arc<Inner>,
}

impl ConnectionStateMachine {
    /// Create a state machine in `Idle`
    pub fn new(
        config: PlaybackConfig,
        signaling: Arc<dyn SignalingTransport>,
        factory: Arc<dyn MediaSessionFactory>,
        sink: Arc<dyn MediaSink>,
        callback: StateCallback,
    ) -> Self {
        Self {
            config,
            signaling,
            factory,
            sink,
            inner: Arc::new(Inner {
                state: parking_lot::RwLock::new(ConnectionState::Idle),
                generation: AtomicU64::new(0),
                session: parking_lot::Mutex::new(None),
                last_stats: parking_lot::Mutex::new(None),
                callback,
            }),
        }
    }

    /// Current state, readable synchronously mid-transition
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.read()
    }

    /// Most recent statistics sample, if any
    pub fn last_stats(&self) -> Option<MediaStats> {
        *self.inner.last_stats.lock()
    }

    /// Begin a new session.
    ///
    /// Resets a `Failed`/`Disconnected` machine back through
    /// `Idle → Connecting`. Negotiation runs in the background; its outcome
    /// (and every later transition) arrives through the state callback.
    pub async fn start(&self, request: PlaybackRequest) -> Result<()> {
        match self.state() {
            ConnectionState::Idle | ConnectionState::Failed | ConnectionState::Disconnected => {}
            state => {
                return Err(Error::SessionActive(format!(
                    "cannot start while {:?}",
                    state
                )));
            }
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.inner.state.write() = ConnectionState::Idle;
        Inner::transition(&self.inner, generation, ConnectionState::Connecting, None);

        let media = self.factory.create(Arc::clone(&self.sink)).await?;
        self.register_peer_events(generation, &media);

        // Connect timeout: if it fires before Connected, the session fails.
        let inner = Arc::clone(&self.inner);
        let timeout_secs = self.config.connect_timeout_secs;
        let timeout_task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
            if inner.generation.load(Ordering::SeqCst) == generation
                && *inner.state.read() == ConnectionState::Connecting
            {
                warn!("Connect timeout after {}s", timeout_secs);
                Inner::fail(&inner, generation, Error::ConnectTimeout(timeout_secs));
            }
        });

        *self.inner.session.lock() = Some(ActiveSession {
            session_id: None,
            media: Arc::clone(&media),
            ice: None,
            timeout_task: Some(timeout_task),
            stats_task: None,
            negotiation_task: None,
        });

        // Negotiate in the background so the timeout can cut it short.
        let inner = Arc::clone(&self.inner);
        let signaling = Arc::clone(&self.signaling);
        let ice_initial = Duration::from_millis(self.config.ice_poll_initial_ms);
        let ice_max = Duration::from_millis(self.config.ice_poll_max_ms);
        let negotiation_task = tokio::spawn(async move {
            let negotiator = SessionNegotiator::new(Arc::clone(&signaling), Arc::clone(&media));
            match negotiator.negotiate(&request).await {
                Ok(negotiated) => {
                    if inner.generation.load(Ordering::SeqCst) != generation {
                        debug!("Discarding stale negotiation for {}", negotiated.session_id);
                        let _ = media.close().await;
                        return;
                    }
                    info!("Session {} negotiated, starting ICE", negotiated.session_id);

                    let ice = Arc::new(IceExchangeCoordinator::new(
                        negotiated.session_id.clone(),
                        signaling,
                        Arc::clone(&media),
                        ice_initial,
                        ice_max,
                    ));
                    ice.start();

                    let mut guard = inner.session.lock();
                    if let Some(session) = guard.as_mut() {
                        session.session_id = Some(negotiated.session_id);
                        session.ice = Some(ice);
                    } else {
                        drop(guard);
                        ice.stop();
                    }
                }
                Err(e) => {
                    Inner::fail(&inner, generation, e);
                }
            }
        });

        if let Some(session) = self.inner.session.lock().as_mut() {
            session.negotiation_task = Some(negotiation_task);
        }

        Ok(())
    }

    /// Tear the session down. Idempotent; safe in any state.
    pub async fn shutdown(&self) {
        // Invalidate in-flight callbacks and timers first
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        let media = {
            let mut guard = self.inner.session.lock();
            guard.take().map(|mut session| {
                Inner::cancel_tasks(&mut session);
                session.media
            })
        };

        if let Some(media) = media {
            if let Err(e) = media.close().await {
                warn!("Error closing media session: {}", e);
            }
        }

        let mut state = self.inner.state.write();
        if *state != ConnectionState::Idle {
            debug!("State machine reset: {:?} -> Idle", *state);
            *state = ConnectionState::Idle;
        }
    }

    /// Route platform state changes into machine transitions
    fn register_peer_events(&self, generation: u64, media: &Arc<dyn MediaSession>) {
        let inner = Arc::clone(&self.inner);
        let stats_interval = self.config.stats_interval_secs;
        let media_for_stats = Arc::clone(media);

        media.on_state_change(Box::new(move |peer_state| {
            if inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            match peer_state {
                PeerSessionState::Connected => {
                    Inner::on_connected(
                        &inner,
                        generation,
                        stats_interval,
                        Arc::clone(&media_for_stats),
                    );
                }
                PeerSessionState::Disconnected => {
                    Inner::on_disconnected(&inner, generation);
                }
                PeerSessionState::Failed => {
                    Inner::fail(
                        &inner,
                        generation,
                        Error::MediaSession("peer connection failed".to_string()),
                    );
                }
                PeerSessionState::IceFailed => {
                    // More actionable than the generic failure, surfaced even
                    // while the outer state is still Connecting.
                    Inner::fail(
                        &inner,
                        generation,
                        Error::IceFailure("ICE transport reported failure".to_string()),
                    );
                }
                PeerSessionState::New | PeerSessionState::Connecting | PeerSessionState::Closed => {
                }
            }
        }));
    }
}

impl Inner {
    /// Apply a transition and notify. Invalid transitions are dropped with a
    /// warning; `Failed`/`Disconnected` are only left by a brand-new start.
    fn transition(
        inner: &Arc<Inner>,
        generation: u64,
        new_state: ConnectionState,
        message: Option<String>,
    ) {
        if inner.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        {
            let mut state = inner.state.write();
            if *state == new_state {
                return;
            }
            let valid = matches!(
                (*state, new_state),
                (ConnectionState::Idle, ConnectionState::Connecting)
                    | (ConnectionState::Connecting, ConnectionState::Connected)
                    | (ConnectionState::Connecting, ConnectionState::Failed)
                    | (ConnectionState::Connected, ConnectionState::Disconnected)
                    | (ConnectionState::Connected, ConnectionState::Failed)
            );
            if !valid {
                warn!(
                    "Ignoring invalid transition {:?} -> {:?}",
                    *state, new_state
                );
                return;
            }
            debug!("Connection state transition: {:?} -> {:?}", *state, new_state);
            *state = new_state;
        }
        // Lock released before re-entering user code
        (inner.callback)(new_state, message);
    }

    fn on_connected(
        inner: &Arc<Inner>,
        generation: u64,
        stats_interval_secs: u64,
        media: Arc<dyn MediaSession>,
    ) {
        {
            let mut guard = inner.session.lock();
            let Some(session) = guard.as_mut() else {
                return;
            };
            if let Some(task) = session.timeout_task.take() {
                task.abort();
            }
            if let Some(ice) = &session.ice {
                ice.stop();
            }

            // Periodic statistics sampling, observability only: a failed or
            // empty sample logs and moves on.
            if stats_interval_secs > 0 && session.stats_task.is_none() {
                let inner_for_stats = Arc::clone(inner);
                session.stats_task = Some(tokio::spawn(async move {
                    let mut ticker =
                        tokio::time::interval(Duration::from_secs(stats_interval_secs));
                    ticker.tick().await; // first tick is immediate
                    loop {
                        ticker.tick().await;
                        if inner_for_stats.generation.load(Ordering::SeqCst) != generation {
                            break;
                        }
                        match media.stats().await {
                            Some(stats) => {
                                debug!(
                                    "Connection stats: {}B received, {} packets, {} lost, jitter {:.4}s, loss {:.2}%",
                                    stats.bytes_received,
                                    stats.packets_received,
                                    stats.packets_lost,
                                    stats.jitter_secs,
                                    stats.loss_rate * 100.0
                                );
                                *inner_for_stats.last_stats.lock() = Some(stats);
                            }
                            None => debug!("No connection stats available"),
                        }
                    }
                }));
            }
        }

        Self::transition(inner, generation, ConnectionState::Connected, None);
    }

    fn on_disconnected(inner: &Arc<Inner>, generation: u64) {
        if *inner.state.read() != ConnectionState::Connected {
            return;
        }
        Self::release(inner);
        Self::transition(inner, generation, ConnectionState::Disconnected, None);
    }

    fn fail(inner: &Arc<Inner>, generation: u64, error: Error) {
        if inner.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let message = error.user_message();
        warn!("Session failed: {}", error);
        Self::release(inner);
        Self::transition(inner, generation, ConnectionState::Failed, Some(message));
    }

    /// Cancel every timer and release the connection
    fn release(inner: &Arc<Inner>) {
        let media = {
            let mut guard = inner.session.lock();
            guard.take().map(|mut session| {
                Self::cancel_tasks(&mut session);
                session.media
            })
        };
        if let Some(media) = media {
            tokio::spawn(async move {
                let _ = media.close().await;
            });
        }
    }

    fn cancel_tasks(session: &mut ActiveSession) {
        debug!(
            "Cancelling timers for session {}",
            session.session_id.as_deref().unwrap_or("<unnegotiated>")
        );
        if let Some(task) = session.timeout_task.take() {
            task.abort();
        }
        if let Some(task) = session.stats_task.take() {
            task.abort();
        }
        if let Some(task) = session.negotiation_task.take() {
            task.abort();
        }
        if let Some(ice) = session.ice.take() {
            ice.stop();
        }
    }
}
