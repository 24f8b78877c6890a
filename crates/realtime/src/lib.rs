// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-side realtime layer for the SmartPath community platform.
//!
//! One shared, reconnecting hub connection per process (registry +
//! lifecycle controller + safe invocation), the chat-session layer a
//! multi-room chat UI needs on top of it, polling stores for
//! notifications and unread-message counts, and the pure optimistic
//! appliers for reaction state and the activity feed.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod feed;
pub mod hub;
pub mod models;
pub mod notify;
pub mod react;
pub mod test_support;

pub use chat::{ChatHandlers, ChatSession};
pub use config::RealtimeConfig;
pub use error::RealtimeError;
pub use hub::connection::HubConnection;
pub use hub::registry::HubRegistry;
pub use hub::state::HubState;
pub use hub::TokenProvider;
pub use notify::{NotificationStore, UnreadMessages};
