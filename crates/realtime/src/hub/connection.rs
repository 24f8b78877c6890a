// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared hub connection: lifecycle state machine, reconnect loop with
//! linear backoff, room rejoin replay, and safe invocation.
//!
//! Consumers hold cheap clones of [`HubConnection`]; every clone drives
//! the same underlying transport session. Event subscribers must attach
//! (via [`HubConnection::subscribe`]) before the connection is started so
//! no push arriving right after connect is missed.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::config::RealtimeConfig;
use crate::error::RealtimeError;
use crate::hub::proto::{self, HubCall, HubEvent};
use crate::hub::state::HubState;
use crate::hub::transport::{self, HubTransport};
use crate::hub::TokenProvider;
use crate::models::ChatId;

/// Shared, reconnecting connection to one hub endpoint.
#[derive(Clone)]
pub struct HubConnection {
    inner: Arc<ConnInner>,
}

struct ConnInner {
    url: String,
    config: RealtimeConfig,
    token: TokenProvider,
    transport: Arc<dyn HubTransport>,
    state: watch::Sender<HubState>,
    events: broadcast::Sender<HubEvent>,
    /// Sender into the live socket; present only while a link is up.
    outbound: parking_lot::Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Rooms to rejoin on every (re)connect, before Connected is announced.
    rejoin: parking_lot::Mutex<BTreeSet<ChatId>>,
    /// Serializes start attempts; concurrent callers share the in-flight one.
    start_lock: tokio::sync::Mutex<()>,
    /// Set while the connection task is alive.
    running: AtomicBool,
    cancel: CancellationToken,
}

impl HubConnection {
    pub fn new(
        config: RealtimeConfig,
        token: TokenProvider,
        transport: Arc<dyn HubTransport>,
    ) -> Self {
        let (state, _) = watch::channel(HubState::Disconnected);
        let (events, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ConnInner {
                url: config.hub_url.clone(),
                config,
                token,
                transport,
                state,
                events,
                outbound: parking_lot::Mutex::new(None),
                rejoin: parking_lot::Mutex::new(BTreeSet::new()),
                start_lock: tokio::sync::Mutex::new(()),
                running: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn hub_url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> HubState {
        *self.inner.state.borrow()
    }

    /// Reactive view of the lifecycle state.
    pub fn watch_state(&self) -> watch::Receiver<HubState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to server-pushed events. Attach before starting the
    /// connection; a broadcast receiver only sees events sent after it
    /// subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.inner.events.subscribe()
    }

    /// Track a room for automatic rejoin after reconnect.
    pub fn register_rejoin(&self, chat_id: ChatId) {
        self.inner.rejoin.lock().insert(chat_id);
    }

    pub fn unregister_rejoin(&self, chat_id: ChatId) {
        self.inner.rejoin.lock().remove(&chat_id);
    }

    /// Idempotently make sure the connection is started.
    ///
    /// Already connected returns immediately. A connection mid-transition
    /// is polled until it settles. A settled-disconnected connection is
    /// started, with at most one start attempt in flight process-wide;
    /// concurrent callers share it rather than racing.
    pub async fn ensure_started(&self) -> Result<(), RealtimeError> {
        match self.state() {
            HubState::Connected => return Ok(()),
            HubState::Connecting | HubState::Reconnecting => {
                for _ in 0..self.inner.config.settle_attempts {
                    tokio::time::sleep(self.inner.config.settle_poll()).await;
                    match self.state() {
                        HubState::Connected => return Ok(()),
                        HubState::Disconnected => break,
                        HubState::Connecting | HubState::Reconnecting => {}
                    }
                }
                if self.state() != HubState::Disconnected {
                    // Did not settle within the ceiling; the caller's own
                    // deadline decides what happens next.
                    return Err(RealtimeError::TransientNetwork(
                        "hub did not settle in time".to_owned(),
                    ));
                }
            }
            HubState::Disconnected => {}
        }
        self.start().await
    }

    /// Block until the hub is connected or `timeout` elapses.
    ///
    /// A poll observing `Disconnected` re-triggers `ensure_started`, so a
    /// start that failed (or a connection that dropped between polls) is
    /// retried until the deadline. This is the only path that converts a
    /// stuck-disconnected connection into a fresh start.
    pub async fn wait_until_connected(&self, timeout: Duration) -> Result<(), RealtimeError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.state() == HubState::Connected {
                return Ok(());
            }
            let now = tokio::time::Instant::now();
            let remaining = match deadline.checked_duration_since(now) {
                Some(left) if !left.is_zero() => left,
                _ => return Err(RealtimeError::ConnectionTimeout),
            };
            if self.state() == HubState::Disconnected {
                match tokio::time::timeout(remaining, self.ensure_started()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => {
                        tracing::debug!(url = %self.inner.url, err = %e, "start retry failed while waiting");
                    }
                    Err(_) => return Err(RealtimeError::ConnectionTimeout),
                }
            }
            tokio::time::sleep(self.inner.config.wait_poll().min(remaining)).await;
        }
    }

    /// Invoke a hub method, guaranteeing a connected transport first.
    ///
    /// At-most-once: if the deadline elapses before the hub connects, the
    /// call fails with `ConnectionTimeout` and is never dispatched.
    pub async fn invoke(
        &self,
        method: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<(), RealtimeError> {
        self.wait_until_connected(self.inner.config.wait_timeout()).await?;
        let call = HubCall::new(method, arguments);
        let frame = serde_json::to_string(&call)
            .map_err(|e| RealtimeError::TransientNetwork(format!("encode {method}: {e}")))?;
        let delivered = self
            .inner
            .outbound
            .lock()
            .as_ref()
            .map(|tx| tx.send(frame).is_ok())
            .unwrap_or(false);
        if delivered {
            Ok(())
        } else {
            Err(RealtimeError::TransientNetwork(format!(
                "{method} not delivered, socket dropped"
            )))
        }
    }

    /// Tear the connection down for good (logout, process shutdown).
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    /// Start the connection task, sharing any start already in flight.
    async fn start(&self) -> Result<(), RealtimeError> {
        let _guard = self.inner.start_lock.lock().await;
        if self.state() == HubState::Connected {
            return Ok(());
        }
        if !self.inner.running.load(Ordering::SeqCst) {
            self.inner.running.store(true, Ordering::SeqCst);
            tokio::spawn(ConnInner::run(Arc::clone(&self.inner)));
        }
        let mut rx = self.inner.state.subscribe();
        loop {
            match *rx.borrow_and_update() {
                HubState::Connected => return Ok(()),
                HubState::Disconnected if !self.inner.running.load(Ordering::SeqCst) => {
                    return Err(RealtimeError::TransientNetwork("hub start failed".to_owned()));
                }
                _ => {}
            }
            if rx.changed().await.is_err() {
                return Err(RealtimeError::TransientNetwork("hub connection gone".to_owned()));
            }
        }
    }
}

impl ConnInner {
    /// Connection task: dial, pump events, reconnect with linear backoff.
    ///
    /// Gives up after `max_dial_attempts` consecutive failures and settles
    /// `Disconnected`; `wait_until_connected` may start it again.
    async fn run(self: Arc<Self>) {
        let mut attempt: u32 = 0;
        let mut ever_connected = false;

        loop {
            if self.cancel.is_cancelled() || attempt >= self.config.max_dial_attempts {
                break;
            }

            let url = transport::with_access_token(&self.url, (self.token)().as_deref());
            self.set_state(if ever_connected || attempt > 0 {
                HubState::Reconnecting
            } else {
                HubState::Connecting
            });

            match self.transport.dial(&url).await {
                Ok(mut link) => {
                    attempt = 0;
                    ever_connected = true;
                    *self.outbound.lock() = Some(link.outbound.clone());
                    // Server-side group membership is restored on the fresh
                    // socket before Connected is announced; observers of
                    // Connected may rely on their room already being joined.
                    self.replay_rejoins(&link.outbound);
                    self.set_state(HubState::Connected);
                    tracing::info!(url = %self.url, "hub connected");

                    loop {
                        tokio::select! {
                            _ = self.cancel.cancelled() => break,
                            frame = link.inbound.recv() => match frame {
                                Some(text) => {
                                    if let Some(event) = proto::parse_event(&text) {
                                        let _ = self.events.send(event);
                                    }
                                }
                                None => {
                                    tracing::debug!(url = %self.url, "hub socket closed");
                                    break;
                                }
                            },
                        }
                    }
                    *self.outbound.lock() = None;
                }
                Err(e) => {
                    tracing::warn!(url = %self.url, attempt, err = %e, "hub dial failed");
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }

            let delay = self.config.backoff_delay(attempt);
            attempt += 1;
            if attempt >= self.config.max_dial_attempts {
                break;
            }
            self.set_state(HubState::Reconnecting);
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        // `running` flips before the state does so a watcher seeing
        // Disconnected can trust the flag.
        self.running.store(false, Ordering::SeqCst);
        *self.outbound.lock() = None;
        self.set_state(HubState::Disconnected);
        tracing::debug!(url = %self.url, "hub connection task stopped");
    }

    /// Re-issue JoinChat for every tracked room on a fresh socket.
    fn replay_rejoins(&self, out: &mpsc::UnboundedSender<String>) {
        let rooms: Vec<ChatId> = self.rejoin.lock().iter().copied().collect();
        for chat_id in rooms {
            match serde_json::to_string(&HubCall::join_chat(chat_id)) {
                Ok(frame) => {
                    if out.send(frame).is_err() {
                        tracing::debug!(%chat_id, "rejoin dropped, socket already gone");
                    } else {
                        tracing::debug!(%chat_id, "rejoined chat after reconnect");
                    }
                }
                Err(e) => tracing::debug!(%chat_id, err = %e, "rejoin encode failed"),
            }
        }
    }

    fn set_state(&self, next: HubState) {
        let prev = self.state.send_replace(next);
        if prev != next {
            tracing::debug!(from = prev.as_str(), to = next.as_str(), "hub state changed");
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
