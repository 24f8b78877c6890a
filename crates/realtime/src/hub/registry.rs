// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide registry of hub connections.
//!
//! Constructed once at application bootstrap and passed by reference;
//! holds at most one live connection per hub endpoint so route
//! transitions and multiple consumers never race duplicate sessions.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::RealtimeConfig;
use crate::hub::connection::HubConnection;
use crate::hub::transport::{HubTransport, WsTransport};
use crate::hub::TokenProvider;

pub struct HubRegistry {
    config: RealtimeConfig,
    transport: Arc<dyn HubTransport>,
    connections: tokio::sync::Mutex<HashMap<String, HubConnection>>,
}

impl HubRegistry {
    pub fn new(config: RealtimeConfig) -> Self {
        Self::with_transport(config, Arc::new(WsTransport))
    }

    /// Build a registry over a custom transport (tests).
    pub fn with_transport(config: RealtimeConfig, transport: Arc<dyn HubTransport>) -> Self {
        Self { config, transport, connections: tokio::sync::Mutex::new(HashMap::new()) }
    }

    /// Return the shared connection for the configured hub endpoint,
    /// creating it on first use. Never yields two different live
    /// instances for one endpoint; a later caller's `token` is ignored
    /// when a connection already exists.
    pub async fn get_or_connect(&self, token: TokenProvider) -> HubConnection {
        let mut connections = self.connections.lock().await;
        if let Some(existing) = connections.get(&self.config.hub_url) {
            return existing.clone();
        }
        let connection =
            HubConnection::new(self.config.clone(), token, Arc::clone(&self.transport));
        connections.insert(self.config.hub_url.clone(), connection.clone());
        connection
    }

    /// Drop every registered connection (logout, tests).
    pub async fn reset(&self) {
        let mut connections = self.connections.lock().await;
        for (_, connection) in connections.drain() {
            connection.close();
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
