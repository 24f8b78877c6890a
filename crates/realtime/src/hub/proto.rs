// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub wire protocol: outbound invocation envelopes and the fixed set of
//! server-pushed chat events, as JSON text frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChatId, ChatMessage, MessageStatus};

/// Hub methods the client invokes.
pub const JOIN_CHAT: &str = "JoinChat";
pub const LEAVE_CHAT: &str = "LeaveChat";
pub const MARK_MESSAGES_READ: &str = "MarkMessagesRead";

/// Outbound hub invocation envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubCall {
    pub target: String,
    pub arguments: Vec<serde_json::Value>,
}

impl HubCall {
    pub fn new(target: &str, arguments: Vec<serde_json::Value>) -> Self {
        Self { target: target.to_owned(), arguments }
    }

    pub fn join_chat(chat_id: ChatId) -> Self {
        Self::new(JOIN_CHAT, vec![serde_json::json!(chat_id)])
    }

    pub fn leave_chat(chat_id: ChatId) -> Self {
        Self::new(LEAVE_CHAT, vec![serde_json::json!(chat_id)])
    }
}

/// A message was posted to a chat the client has joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub message: ChatMessage,
}

/// Cross-chat ping for a message in a chat the client has not joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessageNotification {
    pub chat_id: ChatId,
    pub sender_id: String,
    pub preview: String,
    pub created_at: DateTime<Utc>,
}

/// A single message was marked read by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRead {
    pub chat_id: ChatId,
    pub message_id: Uuid,
    pub reader_id: String,
}

/// Delivery status change for a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStatusUpdated {
    pub chat_id: ChatId,
    pub message_id: Uuid,
    pub status: MessageStatus,
}

/// All messages in a chat were marked read by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadInChat {
    pub chat_id: ChatId,
    pub reader_id: String,
    pub read_at: DateTime<Utc>,
}

/// Server-pushed chat events, tagged by event name on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HubEvent {
    NewMessage(NewMessage),
    NewMessageNotification(NewMessageNotification),
    MessageRead(MessageRead),
    MessageStatusUpdated(MessageStatusUpdated),
    MessagesReadInChat(MessagesReadInChat),
}

impl HubEvent {
    /// The chat this event belongs to.
    pub fn chat_id(&self) -> ChatId {
        match self {
            Self::NewMessage(e) => e.chat_id,
            Self::NewMessageNotification(e) => e.chat_id,
            Self::MessageRead(e) => e.chat_id,
            Self::MessageStatusUpdated(e) => e.chat_id,
            Self::MessagesReadInChat(e) => e.chat_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NewMessage(_) => "NewMessage",
            Self::NewMessageNotification(_) => "NewMessageNotification",
            Self::MessageRead(_) => "MessageRead",
            Self::MessageStatusUpdated(_) => "MessageStatusUpdated",
            Self::MessagesReadInChat(_) => "MessagesReadInChat",
        }
    }
}

/// Parse a server push frame. Frames this client does not consume
/// (keep-alives, unknown event types) yield `None`.
pub fn parse_event(text: &str) -> Option<HubEvent> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod tests;
