// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn token_appended_as_query_parameter() {
    let url = with_access_token("ws://hub.example/hubs/chat", Some("tok-1"));
    assert_eq!(url, "ws://hub.example/hubs/chat?access_token=tok-1");
}

#[test]
fn token_appended_after_existing_query() {
    let url = with_access_token("ws://hub.example/hubs/chat?v=2", Some("tok-1"));
    assert_eq!(url, "ws://hub.example/hubs/chat?v=2&access_token=tok-1");
}

#[test]
fn missing_or_empty_token_leaves_url_unchanged() {
    assert_eq!(with_access_token("ws://hub.example/hubs/chat", None), "ws://hub.example/hubs/chat");
    assert_eq!(
        with_access_token("ws://hub.example/hubs/chat", Some("")),
        "ws://hub.example/hubs/chat"
    );
}
