// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: mock transport, fixtures, fast configs.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::RealtimeConfig;
use crate::hub::transport::{HubLink, HubTransport};
use crate::models::{Chat, ChatMessage, Notification};

/// Dial behavior for [`MockTransport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialMode {
    /// Hand back a working in-memory link.
    Accept,
    /// Fail every dial.
    Refuse,
}

/// Server half of a mocked hub link.
pub struct ServerSide {
    pub from_client: mpsc::UnboundedReceiver<String>,
    pub to_client: mpsc::UnboundedSender<String>,
}

/// In-memory transport that counts dials and exposes the server side of
/// every accepted link through a channel.
pub struct MockTransport {
    pub dials: AtomicUsize,
    mode: parking_lot::Mutex<DialMode>,
    links: mpsc::UnboundedSender<ServerSide>,
}

impl MockTransport {
    pub fn new(mode: DialMode) -> (Arc<Self>, mpsc::UnboundedReceiver<ServerSide>) {
        let (links, link_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            dials: AtomicUsize::new(0),
            mode: parking_lot::Mutex::new(mode),
            links,
        });
        (transport, link_rx)
    }

    pub fn set_mode(&self, mode: DialMode) {
        *self.mode.lock() = mode;
    }
}

#[async_trait]
impl HubTransport for MockTransport {
    async fn dial(&self, _url: &str) -> anyhow::Result<HubLink> {
        self.dials.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match *self.mode.lock() {
            DialMode::Refuse => anyhow::bail!("connection refused"),
            DialMode::Accept => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                let (in_tx, in_rx) = mpsc::unbounded_channel();
                let _ = self.links.send(ServerSide { from_client: out_rx, to_client: in_tx });
                Ok(HubLink { outbound: out_tx, inbound: in_rx })
            }
        }
    }
}

/// Config with millisecond-scale timings so lifecycle tests run fast.
pub fn fast_config() -> RealtimeConfig {
    RealtimeConfig {
        backoff_step_ms: 5,
        backoff_cap_ms: 10,
        max_dial_attempts: 3,
        settle_poll_ms: 5,
        settle_attempts: 10,
        wait_poll_ms: 5,
        wait_timeout_ms: 500,
        notify_poll_ms: 3_600_000,
        unread_poll_ms: 3_600_000,
        ..RealtimeConfig::default()
    }
}

/// A chat message fixture.
pub fn message(sender_id: &str, is_read: bool) -> ChatMessage {
    ChatMessage {
        id: Uuid::new_v4(),
        sender_id: sender_id.to_owned(),
        content: "hello".to_owned(),
        is_read,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single().unwrap_or_default(),
    }
}

/// A chat fixture with the given messages.
pub fn chat(messages: Vec<ChatMessage>) -> Chat {
    Chat { id: Uuid::new_v4(), name: "study group".to_owned(), messages }
}

/// A notification fixture created `minutes_ago` minutes in the past.
pub fn notification(minutes_ago: i64, is_read: bool) -> Notification {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).single().unwrap_or_default();
    Notification {
        id: Uuid::new_v4(),
        message: format!("notification from {minutes_ago}m ago"),
        is_read,
        link: None,
        created_at: base - ChronoDuration::minutes(minutes_ago),
    }
}
