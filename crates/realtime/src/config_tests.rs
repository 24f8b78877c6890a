// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;

#[yare::parameterized(
    first_attempt  = { 0, 1000 },
    second_attempt = { 1, 2000 },
    fourth_attempt = { 3, 4000 },
    capped         = { 9, 5000 },
    far_past_cap   = { 1000, 5000 },
)]
fn backoff_grows_linearly_up_to_the_cap(attempt: u32, want_ms: u64) {
    let config = RealtimeConfig::default();
    assert_eq!(config.backoff_delay(attempt), Duration::from_millis(want_ms));
}

#[test]
fn backoff_respects_custom_schedule() {
    let config = RealtimeConfig { backoff_step_ms: 10, backoff_cap_ms: 25, ..Default::default() };
    assert_eq!(config.backoff_delay(0), Duration::from_millis(10));
    assert_eq!(config.backoff_delay(1), Duration::from_millis(20));
    assert_eq!(config.backoff_delay(2), Duration::from_millis(25));
}

#[test]
fn interval_accessors_reflect_the_millisecond_fields() {
    let config = RealtimeConfig::default();
    assert_eq!(config.settle_poll(), Duration::from_millis(200));
    assert_eq!(config.wait_poll(), Duration::from_millis(150));
    assert_eq!(config.wait_timeout(), Duration::from_secs(10));
    assert_eq!(config.notify_poll_interval(), Duration::from_secs(20));
    assert_eq!(config.unread_poll_interval(), Duration::from_secs(30));
}

#[test]
fn reset_on_disable_defaults_on() {
    assert!(RealtimeConfig::default().reset_on_disable);
}
