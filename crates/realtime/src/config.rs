// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the realtime client layer.
///
/// The reconnect/backoff schedule and the polling constants are policy
/// knobs, not protocol requirements; the defaults match the production
/// deployment.
#[derive(Debug, Clone, clap::Args)]
pub struct RealtimeConfig {
    /// Hub WebSocket endpoint URL.
    #[arg(long, default_value = "ws://127.0.0.1:5041/hubs/chat", env = "SMARTPATH_HUB_URL")]
    pub hub_url: String,

    /// REST API base URL.
    #[arg(long, default_value = "http://127.0.0.1:5041", env = "SMARTPATH_API_URL")]
    pub api_url: String,

    /// Reconnect backoff step in milliseconds; attempt n waits `step * (n + 1)`.
    #[arg(long, default_value_t = 1000, env = "SMARTPATH_BACKOFF_STEP_MS")]
    pub backoff_step_ms: u64,

    /// Reconnect backoff ceiling in milliseconds.
    #[arg(long, default_value_t = 5000, env = "SMARTPATH_BACKOFF_CAP_MS")]
    pub backoff_cap_ms: u64,

    /// Consecutive failed dials before the connection settles disconnected.
    #[arg(long, default_value_t = 4, env = "SMARTPATH_MAX_DIAL_ATTEMPTS")]
    pub max_dial_attempts: u32,

    /// Poll interval while waiting for a transitioning connection to settle, ms.
    #[arg(long, default_value_t = 200, env = "SMARTPATH_SETTLE_POLL_MS")]
    pub settle_poll_ms: u64,

    /// Number of settle polls before giving the connection back to the caller.
    #[arg(long, default_value_t = 50, env = "SMARTPATH_SETTLE_ATTEMPTS")]
    pub settle_attempts: u32,

    /// Poll interval inside `wait_until_connected`, ms.
    #[arg(long, default_value_t = 150, env = "SMARTPATH_WAIT_POLL_MS")]
    pub wait_poll_ms: u64,

    /// Default deadline for `wait_until_connected` and safe invocations, ms.
    #[arg(long, default_value_t = 10000, env = "SMARTPATH_WAIT_TIMEOUT_MS")]
    pub wait_timeout_ms: u64,

    /// Notification poll interval, ms.
    #[arg(long, default_value_t = 20000, env = "SMARTPATH_NOTIFY_POLL_MS")]
    pub notify_poll_ms: u64,

    /// Message-unread aggregation poll interval, ms.
    #[arg(long, default_value_t = 30000, env = "SMARTPATH_UNREAD_POLL_MS")]
    pub unread_poll_ms: u64,

    /// Clear notification state when polling is disabled or the session is lost.
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "SMARTPATH_RESET_ON_DISABLE"
    )]
    pub reset_on_disable: bool,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            hub_url: "ws://127.0.0.1:5041/hubs/chat".to_owned(),
            api_url: "http://127.0.0.1:5041".to_owned(),
            backoff_step_ms: 1000,
            backoff_cap_ms: 5000,
            max_dial_attempts: 4,
            settle_poll_ms: 200,
            settle_attempts: 50,
            wait_poll_ms: 150,
            wait_timeout_ms: 10000,
            notify_poll_ms: 20000,
            unread_poll_ms: 30000,
            reset_on_disable: true,
        }
    }
}

impl RealtimeConfig {
    /// Delay before reconnect attempt `attempt` (0-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let ms = self.backoff_step_ms.saturating_mul(u64::from(attempt) + 1);
        Duration::from_millis(ms.min(self.backoff_cap_ms))
    }

    pub fn settle_poll(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }

    pub fn wait_poll(&self) -> Duration {
        Duration::from_millis(self.wait_poll_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn notify_poll_interval(&self) -> Duration {
        Duration::from_millis(self.notify_poll_ms)
    }

    pub fn unread_poll_interval(&self) -> Duration {
        Duration::from_millis(self.unread_poll_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
