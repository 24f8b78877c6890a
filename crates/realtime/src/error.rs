// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// Failures surfaced by the realtime client layer.
///
/// Background tasks (polling, reconnect) log these and carry on; only
/// user-initiated operations propagate them to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeError {
    /// `wait_until_connected` deadline elapsed before the hub reached connected.
    ConnectionTimeout,
    /// The backend rejected the session (HTTP 401 or expired-token text).
    AuthenticationLost,
    /// Any other network or transport failure; prior local state is kept.
    TransientNetwork(String),
    /// A room leave/join call failed; local tracking advanced anyway.
    RoomTransition(String),
}

impl RealtimeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionTimeout => "CONNECTION_TIMEOUT",
            Self::AuthenticationLost => "AUTHENTICATION_LOST",
            Self::TransientNetwork(_) => "TRANSIENT_NETWORK",
            Self::RoomTransition(_) => "ROOM_TRANSITION",
        }
    }
}

impl fmt::Display for RealtimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionTimeout => f.write_str("hub connection timed out"),
            Self::AuthenticationLost => f.write_str("session authentication lost"),
            Self::TransientNetwork(detail) => write!(f, "network failure: {detail}"),
            Self::RoomTransition(detail) => write!(f, "room transition failed: {detail}"),
        }
    }
}

impl std::error::Error for RealtimeError {}

/// Heuristic check for a lost session behind a failed REST call.
///
/// A 401 status is authoritative; otherwise the error text is sniffed for
/// the session/token phrases the backend is known to emit.
pub fn is_auth_loss(err: &anyhow::Error) -> bool {
    if let Some(req) = err.downcast_ref::<reqwest::Error>() {
        if req.status() == Some(reqwest::StatusCode::UNAUTHORIZED) {
            return true;
        }
    }
    let text = format!("{err:#}").to_lowercase();
    text.contains("401")
        || text.contains("unauthorized")
        || text.contains("session expired")
        || text.contains("token expired")
        || text.contains("missing auth token")
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
