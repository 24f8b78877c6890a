// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::api::ChatsApi;
use crate::test_support::{chat, fast_config, message};

struct StubChats {
    calls: AtomicUsize,
    fail_auth: AtomicBool,
    chats: Vec<Chat>,
}

#[async_trait]
impl ChatsApi for StubChats {
    async fn my_chats(&self) -> anyhow::Result<Vec<Chat>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_auth.load(Ordering::SeqCst) {
            anyhow::bail!("401 unauthorized");
        }
        Ok(self.chats.clone())
    }
}

fn fixture() -> Vec<Chat> {
    vec![
        chat(vec![message("alice", false), message("me", false), message("alice", true)]),
        chat(vec![message("bob", false)]),
    ]
}

// ── pure counting ─────────────────────────────────────────────────────

#[test]
fn unread_in_skips_own_and_read_messages() {
    assert_eq!(unread_in(&fixture(), "me"), 2);
}

#[test]
fn unread_in_empty_chats_is_zero() {
    assert_eq!(unread_in(&[], "me"), 0);
    assert_eq!(unread_in(&[chat(vec![])], "me"), 0);
}

// ── poller ────────────────────────────────────────────────────────────

#[tokio::test]
async fn enabled_poller_publishes_the_count() {
    let api = Arc::new(StubChats {
        calls: AtomicUsize::new(0),
        fail_auth: AtomicBool::new(false),
        chats: fixture(),
    });
    let poller = UnreadMessages::new(api, "me".to_owned(), &fast_config());
    poller.enable();

    for _ in 0..200 {
        if poller.count() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(poller.count(), 2);
}

#[tokio::test]
async fn auth_loss_resets_the_count() {
    let api = Arc::new(StubChats {
        calls: AtomicUsize::new(0),
        fail_auth: AtomicBool::new(false),
        chats: fixture(),
    });
    let poller = UnreadMessages::new(api.clone(), "me".to_owned(), &fast_config());
    poller.enable();
    for _ in 0..200 {
        if poller.count() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    api.fail_auth.store(true, Ordering::SeqCst);
    poller.refresh().await;
    assert_eq!(poller.count(), 0);
}

#[tokio::test]
async fn refresh_while_disabled_does_not_call_the_api() {
    let api = Arc::new(StubChats {
        calls: AtomicUsize::new(0),
        fail_auth: AtomicBool::new(false),
        chats: fixture(),
    });
    let poller = UnreadMessages::new(api.clone(), "me".to_owned(), &fast_config());

    poller.refresh().await;
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
}
