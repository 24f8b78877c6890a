// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport seam between the connection manager and the wire.
//!
//! The production transport is a tokio-tungstenite WebSocket; tests swap
//! in an in-memory implementation through [`HubTransport`].

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Duplex text-frame link to a live hub socket.
///
/// `inbound` yielding `None` means the socket closed; dropping `outbound`
/// tears the write half down.
pub struct HubLink {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Dials a hub endpoint and hands back a duplex frame link.
#[async_trait]
pub trait HubTransport: Send + Sync + 'static {
    /// Establish a connection; resolves once the socket is open.
    async fn dial(&self, url: &str) -> anyhow::Result<HubLink>;
}

/// Production transport over tokio-tungstenite.
pub struct WsTransport;

#[async_trait]
impl HubTransport for WsTransport {
    async fn dial(&self, url: &str) -> anyhow::Result<HubLink> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url).await?;
        let (mut write, mut read) = ws_stream.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        // Write pump: frames queued by the connection go out on the socket.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if write.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
        });

        // Read pump: text frames come back; anything else is transport noise.
        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) | Err(_) => break,
                    Ok(_) => {} // ping/pong/binary ignored
                }
            }
        });

        Ok(HubLink { outbound: out_tx, inbound: in_rx })
    }
}

/// Append the freshly resolved access token as a query parameter.
pub fn with_access_token(base: &str, token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{base}{sep}access_token={token}")
        }
        _ => base.to_owned(),
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
