// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use super::*;
use crate::hub::proto::HubCall;
use crate::hub::TokenProvider;
use crate::test_support::{fast_config, DialMode, MockTransport, ServerSide};

fn no_token() -> TokenProvider {
    Arc::new(|| None)
}

fn session_over_mock() -> (ChatSession, tokio::sync::mpsc::UnboundedReceiver<ServerSide>) {
    let (transport, links) = MockTransport::new(DialMode::Accept);
    let conn = HubConnection::new(fast_config(), no_token(), transport);
    (ChatSession::new(conn), links)
}

fn drain_calls(server: &mut ServerSide) -> Vec<HubCall> {
    let mut calls = Vec::new();
    while let Ok(frame) = server.from_client.try_recv() {
        if let Ok(call) = serde_json::from_str(&frame) {
            calls.push(call);
        }
    }
    calls
}

// ── switch idempotence ────────────────────────────────────────────────

#[tokio::test]
async fn switching_to_the_same_room_twice_joins_once() {
    let (session, mut links) = session_over_mock();
    let room = Uuid::new_v4();

    session.switch_to(Some(room)).await;
    session.switch_to(Some(room)).await;

    let mut server = links.recv().await.expect("link");
    let calls = drain_calls(&mut server);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, proto::JOIN_CHAT);
}

#[tokio::test]
async fn switching_rooms_leaves_old_then_joins_new() {
    let (session, mut links) = session_over_mock();
    let (room_a, room_b) = (Uuid::new_v4(), Uuid::new_v4());

    session.switch_to(Some(room_a)).await;
    session.switch_to(Some(room_b)).await;

    let mut server = links.recv().await.expect("link");
    let calls = drain_calls(&mut server);
    let targets: Vec<&str> = calls.iter().map(|c| c.target.as_str()).collect();
    assert_eq!(targets, vec![proto::JOIN_CHAT, proto::LEAVE_CHAT, proto::JOIN_CHAT]);
    assert_eq!(calls[1].arguments, vec![serde_json::json!(room_a)]);
    assert_eq!(calls[2].arguments, vec![serde_json::json!(room_b)]);
}

#[tokio::test]
async fn switching_to_none_leaves_the_room() {
    let (session, mut links) = session_over_mock();
    let room = Uuid::new_v4();

    session.switch_to(Some(room)).await;
    session.switch_to(None).await;

    let mut server = links.recv().await.expect("link");
    let targets: Vec<String> = drain_calls(&mut server).into_iter().map(|c| c.target).collect();
    assert_eq!(targets, vec![proto::JOIN_CHAT.to_owned(), proto::LEAVE_CHAT.to_owned()]);
}

// ── reconnect rejoin via the switch path ──────────────────────────────

#[tokio::test]
async fn current_room_is_rejoined_after_reconnect() {
    let (session, mut links) = session_over_mock();
    let room = Uuid::new_v4();

    session.switch_to(Some(room)).await;
    let mut server = links.recv().await.expect("first link");
    let _ = drain_calls(&mut server);

    drop(server);
    let mut server2 = links.recv().await.expect("second link");

    for _ in 0..200 {
        if session.connected() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(session.connected());

    let calls = drain_calls(&mut server2);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, proto::JOIN_CHAT);
    assert_eq!(calls[0].arguments, vec![serde_json::json!(room)]);
}

// ── idempotent handler binding ────────────────────────────────────────

#[tokio::test]
async fn rebinding_handlers_does_not_duplicate_delivery() {
    let (session, mut links) = session_over_mock();
    let seen = Arc::new(AtomicUsize::new(0));

    let handlers = |seen: Arc<AtomicUsize>| ChatHandlers {
        on_messages_read_in_chat: Some(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })),
        ..ChatHandlers::default()
    };

    // Two binds, as a re-rendering view would do.
    session.bind(handlers(Arc::clone(&seen)));
    session.bind(handlers(Arc::clone(&seen)));

    session.ensure_started().await.expect("start");
    let server = links.recv().await.expect("link");
    let frame = serde_json::json!({
        "type": "MessagesReadInChat",
        "chatId": Uuid::new_v4(),
        "readerId": "user-1",
        "readAt": "2026-08-01T12:00:00Z",
    });
    server.to_client.send(frame.to_string()).expect("push");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(seen.load(Ordering::SeqCst), 1, "each push fires the callback exactly once");
}

// ── mark messages read ────────────────────────────────────────────────

#[tokio::test]
async fn mark_messages_read_goes_through_the_safe_path() {
    let (session, mut links) = session_over_mock();
    let room = Uuid::new_v4();

    session.mark_messages_read(room).await.expect("mark read");

    let mut server = links.recv().await.expect("link");
    let calls = drain_calls(&mut server);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].target, proto::MARK_MESSAGES_READ);
}
