// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling notification store.
//!
//! Refreshes the unread count and the notification list over REST on an
//! interval. Overlapping refreshes are suppressed rather than raced, so
//! a slow network combined with a short interval cannot produce
//! out-of-order state writes. Authentication loss clears local state
//! (configurable); any other failure keeps the previous state so a blip
//! never blanks the UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::NotificationsApi;
use crate::config::RealtimeConfig;
use crate::error::is_auth_loss;
use crate::models::Notification;
use crate::notify::TimerHandle;

/// Point-in-time view of the notification state, newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    pub items: Vec<Notification>,
    pub unread: u32,
}

/// Timer-driven notification store. Cheap to clone.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    api: Arc<dyn NotificationsApi>,
    reset_on_disable: bool,
    interval: parking_lot::Mutex<Duration>,
    state: watch::Sender<NotificationSnapshot>,
    refreshing: AtomicBool,
    enabled: AtomicBool,
    timer: parking_lot::Mutex<Option<TimerHandle>>,
}

impl NotificationStore {
    pub fn new(api: Arc<dyn NotificationsApi>, config: &RealtimeConfig) -> Self {
        let (state, _) = watch::channel(NotificationSnapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                api,
                reset_on_disable: config.reset_on_disable,
                interval: parking_lot::Mutex::new(config.notify_poll_interval()),
                state,
                refreshing: AtomicBool::new(false),
                enabled: AtomicBool::new(false),
                timer: parking_lot::Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> NotificationSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Reactive view of the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.inner.state.subscribe()
    }

    /// Start polling: an immediate refresh, then the interval timer.
    pub fn enable(&self) {
        if self.inner.enabled.swap(true, Ordering::SeqCst) {
            return;
        }
        Self::start_timer(&self.inner);
    }

    /// Stop polling; clears local state when configured to.
    pub fn disable(&self) {
        if !self.inner.enabled.swap(false, Ordering::SeqCst) {
            return;
        }
        self.inner.stop_timer();
        if self.inner.reset_on_disable {
            self.inner.state.send_replace(NotificationSnapshot::default());
        }
    }

    /// Change the poll interval; restarts the timer when polling is active.
    pub fn set_interval(&self, interval: Duration) {
        *self.inner.interval.lock() = interval;
        if self.inner.enabled.load(Ordering::SeqCst) {
            self.inner.stop_timer();
            Self::start_timer(&self.inner);
        }
    }

    /// Refresh now. No-op while disabled or while a previous refresh is
    /// still in flight.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    /// Optimistically mark one notification read, then tell the backend.
    ///
    /// A rejected call is logged, not rolled back — on a 401 the user is
    /// effectively signed out and the local state is about to be reset
    /// anyway.
    pub async fn mark_read(&self, id: Uuid) {
        self.inner.state.send_modify(|snapshot| {
            if let Some(item) = snapshot.items.iter_mut().find(|n| n.id == id) {
                item.is_read = true;
            }
            snapshot.unread = snapshot.unread.saturating_sub(1);
        });
        if let Err(e) = self.inner.api.mark_read(id).await {
            if is_auth_loss(&e) {
                tracing::debug!(%id, "mark-read rejected, session lost");
            } else {
                tracing::debug!(%id, err = %e, "mark-read failed");
            }
        }
    }

    fn start_timer(inner: &Arc<StoreInner>) {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let weak = Arc::downgrade(inner);
        let interval = *inner.interval.lock();
        let task = tokio::spawn(async move {
            // The first tick fires immediately: enabling implies an
            // immediate refresh.
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = timer.tick() => {}
                }
                let Some(store) = Weak::upgrade(&weak) else { break };
                store.refresh().await;
            }
        });
        if let Some(old) = inner.timer.lock().replace(TimerHandle { cancel, task }) {
            old.stop();
        }
    }
}

impl StoreInner {
    async fn refresh(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        if self.refreshing.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err()
        {
            return;
        }
        match self.fetch().await {
            Ok(snapshot) => {
                self.state.send_replace(snapshot);
            }
            Err(e) => {
                if is_auth_loss(&e) {
                    tracing::debug!(err = %e, "notification refresh rejected, session lost");
                    if self.reset_on_disable {
                        self.state.send_replace(NotificationSnapshot::default());
                    }
                } else {
                    tracing::debug!(err = %e, "notification refresh failed, keeping previous state");
                }
            }
        }
        self.refreshing.store(false, Ordering::SeqCst);
    }

    async fn fetch(&self) -> anyhow::Result<NotificationSnapshot> {
        let (items, unread) = tokio::try_join!(self.api.mine(), self.api.unread_count())?;
        let mut items = items;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(NotificationSnapshot { items, unread })
    }

    fn stop_timer(&self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.stop();
        }
    }
}

impl Drop for StoreInner {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
