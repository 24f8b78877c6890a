// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hub connection core: registry, lifecycle, transport seam, wire protocol.

pub mod connection;
pub mod proto;
pub mod registry;
pub mod state;
pub mod transport;

use std::sync::Arc;

/// Supplies the current access token.
///
/// Resolved freshly on every (re)connect attempt and REST call, so a
/// refreshed token is picked up without rebuilding the connection or
/// the API client.
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;
