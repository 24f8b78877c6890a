// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-consumer chat session: tracks which single room the view is
//! subscribed to and fans pushed events out to its callbacks.
//!
//! Bind handlers before starting the connection so no push arriving
//! right after connect is missed. A session tracks at most one room;
//! switching is leave-then-join, and the tracked room is rejoined
//! automatically after a reconnect (before `Connected` is observable).

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::error::RealtimeError;
use crate::hub::connection::HubConnection;
use crate::hub::proto::{
    self, HubEvent, MessageRead, MessageStatusUpdated, MessagesReadInChat, NewMessage,
    NewMessageNotification,
};
use crate::hub::state::HubState;
use crate::models::ChatId;

pub type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Callbacks for the fixed set of server-pushed chat events.
#[derive(Default)]
pub struct ChatHandlers {
    pub on_new_message: Option<Callback<NewMessage>>,
    pub on_new_message_notification: Option<Callback<NewMessageNotification>>,
    pub on_message_read: Option<Callback<MessageRead>>,
    pub on_message_status_updated: Option<Callback<MessageStatusUpdated>>,
    pub on_messages_read_in_chat: Option<Callback<MessagesReadInChat>>,
}

impl ChatHandlers {
    fn dispatch(&self, event: &HubEvent) {
        match event {
            HubEvent::NewMessage(e) => {
                if let Some(f) = &self.on_new_message {
                    f(e);
                }
            }
            HubEvent::NewMessageNotification(e) => {
                if let Some(f) = &self.on_new_message_notification {
                    f(e);
                }
            }
            HubEvent::MessageRead(e) => {
                if let Some(f) = &self.on_message_read {
                    f(e);
                }
            }
            HubEvent::MessageStatusUpdated(e) => {
                if let Some(f) = &self.on_message_status_updated {
                    f(e);
                }
            }
            HubEvent::MessagesReadInChat(e) => {
                if let Some(f) = &self.on_messages_read_in_chat {
                    f(e);
                }
            }
        }
    }
}

/// One chat view's handle on the shared hub connection.
pub struct ChatSession {
    conn: HubConnection,
    /// The single room this session is subscribed to. The async mutex
    /// also serializes switches: a new switch waits for the previous
    /// leave/join pair to finish.
    current: tokio::sync::Mutex<Option<ChatId>>,
    fanout: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl ChatSession {
    pub fn new(conn: HubConnection) -> Self {
        Self {
            conn,
            current: tokio::sync::Mutex::new(None),
            fanout: parking_lot::Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn connection(&self) -> &HubConnection {
        &self.conn
    }

    /// Current connection status as the UI sees it.
    pub fn connected(&self) -> bool {
        self.conn.state().is_connected()
    }

    pub fn watch_state(&self) -> watch::Receiver<HubState> {
        self.conn.watch_state()
    }

    /// Make sure the shared connection is up (idempotent).
    pub async fn ensure_started(&self) -> Result<(), RealtimeError> {
        self.conn.ensure_started().await
    }

    /// Bind the chat event callbacks.
    ///
    /// Rebinding is safe: the previous binding is torn down before the
    /// new one is installed, so a server push never reaches a callback
    /// more than once per bind no matter how often the owning view
    /// re-renders.
    pub fn bind(&self, handlers: ChatHandlers) {
        if let Some(previous) = self.fanout.lock().take() {
            previous.abort();
        }
        let mut rx = self.conn.subscribe();
        let cancel = self.cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Ok(event) => handlers.dispatch(&event),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "chat event fan-out lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
        *self.fanout.lock() = Some(task);
    }

    /// Switch the active room.
    ///
    /// No-op when the target equals the tracked room. Otherwise the old
    /// room is left and the new one joined through the safe invocation
    /// path. Local tracking advances even when a call fails (logged),
    /// so the tracker cannot wedge; the next reconnect rejoin squares
    /// server-side membership.
    pub async fn switch_to(&self, next: Option<ChatId>) {
        let mut current = self.current.lock().await;
        if *current == next {
            return;
        }
        if let Some(prev) = *current {
            self.conn.unregister_rejoin(prev);
            if let Err(e) = self.conn.invoke(proto::LEAVE_CHAT, vec![serde_json::json!(prev)]).await
            {
                tracing::warn!(chat_id = %prev, err = %e, "leave failed during room switch");
            }
        }
        if let Some(room) = next {
            self.conn.register_rejoin(room);
            if let Err(e) = self.conn.invoke(proto::JOIN_CHAT, vec![serde_json::json!(room)]).await
            {
                tracing::warn!(chat_id = %room, err = %e, "join failed during room switch");
            }
        }
        *current = next;
    }

    /// Imperative join for membership managed outside the switch path.
    pub async fn join(&self, chat_id: ChatId) -> Result<(), RealtimeError> {
        self.conn.register_rejoin(chat_id);
        self.conn
            .invoke(proto::JOIN_CHAT, vec![serde_json::json!(chat_id)])
            .await
            .map_err(|e| RealtimeError::RoomTransition(format!("join {chat_id}: {e}")))
    }

    /// Imperative leave for membership managed outside the switch path.
    pub async fn leave(&self, chat_id: ChatId) -> Result<(), RealtimeError> {
        self.conn.unregister_rejoin(chat_id);
        self.conn
            .invoke(proto::LEAVE_CHAT, vec![serde_json::json!(chat_id)])
            .await
            .map_err(|e| RealtimeError::RoomTransition(format!("leave {chat_id}: {e}")))
    }

    /// Ask the server to mark every message in a chat read.
    pub async fn mark_messages_read(&self, chat_id: ChatId) -> Result<(), RealtimeError> {
        self.conn.invoke(proto::MARK_MESSAGES_READ, vec![serde_json::json!(chat_id)]).await
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.fanout.lock().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
