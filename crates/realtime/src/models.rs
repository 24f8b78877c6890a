// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data transfer types shared between the REST boundary and the hub layer.
//!
//! All wire JSON uses camelCase field names; the backend is the source of
//! truth for these shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a chat conversation (a hub room).
pub type ChatId = Uuid;

/// A chat conversation the current user participates in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    pub name: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// A single message within a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Delivery status of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
}

/// A notification shown in the bell menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment on a forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Target of a like/dislike mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Post(Uuid),
    Comment(Uuid),
}

impl ReactionTarget {
    /// REST path of this target's reaction resource.
    pub fn reactions_path(&self) -> String {
        match self {
            Self::Post(id) => format!("/api/posts/{id}/reactions"),
            Self::Comment(id) => format!("/api/comments/{id}/reactions"),
        }
    }
}
