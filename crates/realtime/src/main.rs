// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic probe for the realtime layer: connects to a hub, joins a
//! room, and tails pushed events and notification state to the log.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;

use smartpath_realtime::api::ApiClient;
use smartpath_realtime::{
    ChatHandlers, ChatSession, HubRegistry, NotificationStore, RealtimeConfig, TokenProvider,
};

#[derive(Debug, Parser)]
#[command(name = "smartpath-rt", about = "SmartPath realtime diagnostic probe")]
struct Cli {
    #[command(flatten)]
    config: RealtimeConfig,

    /// Chat to join for the duration of the run.
    #[arg(long)]
    room: Option<Uuid>,

    /// Bearer token for hub and API auth.
    #[arg(long, env = "SMARTPATH_TOKEN")]
    token: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let token = cli.token.clone();
    let provider: TokenProvider = Arc::new(move || token.clone());

    let registry = HubRegistry::new(cli.config.clone());
    let connection = registry.get_or_connect(Arc::clone(&provider)).await;
    let session = ChatSession::new(connection.clone());

    // Handlers go on before the connection starts so nothing pushed
    // right after connect is missed.
    session.bind(ChatHandlers {
        on_new_message: Some(Box::new(|e| {
            info!(chat_id = %e.chat_id, sender = %e.message.sender_id, "new message");
        })),
        on_new_message_notification: Some(Box::new(|e| {
            info!(chat_id = %e.chat_id, sender = %e.sender_id, "message notification");
        })),
        on_message_read: Some(Box::new(|e| {
            info!(chat_id = %e.chat_id, message_id = %e.message_id, "message read");
        })),
        on_message_status_updated: Some(Box::new(|e| {
            info!(chat_id = %e.chat_id, message_id = %e.message_id, "message status updated");
        })),
        on_messages_read_in_chat: Some(Box::new(|e| {
            info!(chat_id = %e.chat_id, reader = %e.reader_id, "messages read in chat");
        })),
    });

    connection.wait_until_connected(cli.config.wait_timeout()).await?;
    if let Some(room) = cli.room {
        session.switch_to(Some(room)).await;
        info!(chat_id = %room, "joined chat");
    }

    let api = Arc::new(ApiClient::new(cli.config.api_url.clone(), provider));
    let store = NotificationStore::new(api, &cli.config);
    store.enable();

    let mut notifications = store.subscribe();
    tokio::spawn(async move {
        while notifications.changed().await.is_ok() {
            let snapshot = notifications.borrow().clone();
            info!(unread = snapshot.unread, items = snapshot.items.len(), "notifications updated");
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    store.disable();
    session.switch_to(None).await;
    registry.reset().await;
    Ok(())
}
