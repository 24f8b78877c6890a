// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message-unread aggregation poller.
//!
//! Publishes the number of unread messages sent to the current user
//! across all their chats. Runs on a slower timer than the notification
//! store; same overlap guard, same keep-prior-state failure policy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::ChatsApi;
use crate::config::RealtimeConfig;
use crate::error::is_auth_loss;
use crate::models::Chat;
use crate::notify::TimerHandle;

/// Count messages not yet read that were sent by someone else.
pub fn unread_in(chats: &[Chat], user_id: &str) -> u32 {
    chats
        .iter()
        .flat_map(|chat| &chat.messages)
        .filter(|m| !m.is_read && m.sender_id != user_id)
        .count() as u32
}

/// Timer-driven unread-message counter. Cheap to clone.
#[derive(Clone)]
pub struct UnreadMessages {
    inner: Arc<UnreadInner>,
}

struct UnreadInner {
    api: Arc<dyn ChatsApi>,
    user_id: String,
    interval: Duration,
    count: watch::Sender<u32>,
    refreshing: AtomicBool,
    enabled: AtomicBool,
    timer: parking_lot::Mutex<Option<TimerHandle>>,
}

impl UnreadMessages {
    pub fn new(api: Arc<dyn ChatsApi>, user_id: String, config: &RealtimeConfig) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            inner: Arc::new(UnreadInner {
                api,
                user_id,
                interval: config.unread_poll_interval(),
                count,
                refreshing: AtomicBool::new(false),
                enabled: AtomicBool::new(false),
                timer: parking_lot::Mutex::new(None),
            }),
        }
    }

    pub fn count(&self) -> u32 {
        *self.inner.count.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.inner.count.subscribe()
    }

    pub fn enable(&self) {
        if self.inner.enabled.swap(true, Ordering::SeqCst) {
            return;
        }
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.interval;
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = timer.tick() => {}
                }
                let Some(inner) = Weak::upgrade(&weak) else { break };
                inner.refresh().await;
            }
        });
        if let Some(old) = self.inner.timer.lock().replace(TimerHandle { cancel, task }) {
            old.stop();
        }
    }

    pub fn disable(&self) {
        if !self.inner.enabled.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.inner.timer.lock().take() {
            handle.stop();
        }
    }

    /// Recount now. No-op while disabled or mid-refresh.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }
}

impl UnreadInner {
    async fn refresh(&self) {
        if !self.enabled.load(Ordering::SeqCst) {
            return;
        }
        if self.refreshing.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err()
        {
            return;
        }
        match self.api.my_chats().await {
            Ok(chats) => {
                self.count.send_replace(unread_in(&chats, &self.user_id));
            }
            Err(e) => {
                if is_auth_loss(&e) {
                    tracing::debug!(err = %e, "unread poll rejected, session lost");
                    self.count.send_replace(0);
                } else {
                    tracing::debug!(err = %e, "unread poll failed, keeping previous count");
                }
            }
        }
        self.refreshing.store(false, Ordering::SeqCst);
    }
}

impl Drop for UnreadInner {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.lock().take() {
            handle.stop();
        }
    }
}

#[cfg(test)]
#[path = "unread_tests.rs"]
mod tests;
