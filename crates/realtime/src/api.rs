// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! REST boundary the realtime layer consumes.
//!
//! The traits are the seams the stores and appliers are written against;
//! [`ApiClient`] is the reqwest-backed production implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::hub::TokenProvider;
use crate::models::{Chat, Comment, Notification, ReactionTarget};

#[async_trait]
pub trait ChatsApi: Send + Sync {
    /// All chats the current user participates in, messages included.
    async fn my_chats(&self) -> anyhow::Result<Vec<Chat>>;
}

#[async_trait]
pub trait NotificationsApi: Send + Sync {
    async fn mine(&self) -> anyhow::Result<Vec<Notification>>;
    async fn unread_count(&self) -> anyhow::Result<u32>;
    async fn mark_read(&self, id: Uuid) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ReactionsApi: Send + Sync {
    async fn react(&self, target: ReactionTarget, is_positive: bool) -> anyhow::Result<()>;
    async fn remove_reaction(&self, target: ReactionTarget) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CommentsApi: Send + Sync {
    /// Comments on a post, oldest first.
    async fn comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
}

/// HTTP client for the SmartPath REST API.
pub struct ApiClient {
    base_url: String,
    token: TokenProvider,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: String, token: TokenProvider) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { base_url: base_url.trim_end_matches('/').to_owned(), token, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (self.token)() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let req = self.client.get(self.url(path));
        let resp = self.apply_auth(req).send().await?;
        let value = resp.error_for_status()?.json().await?;
        Ok(value)
    }

    async fn post_empty(&self, path: &str, body: Option<&serde_json::Value>) -> anyhow::Result<()> {
        let mut req = self.client.post(self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        self.apply_auth(req).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ChatsApi for ApiClient {
    async fn my_chats(&self) -> anyhow::Result<Vec<Chat>> {
        self.get_json("/api/chats/mine").await
    }
}

#[async_trait]
impl NotificationsApi for ApiClient {
    async fn mine(&self) -> anyhow::Result<Vec<Notification>> {
        self.get_json("/api/notifications/mine").await
    }

    async fn unread_count(&self) -> anyhow::Result<u32> {
        self.get_json("/api/notifications/unread-count").await
    }

    async fn mark_read(&self, id: Uuid) -> anyhow::Result<()> {
        self.post_empty(&format!("/api/notifications/{id}/read"), None).await
    }
}

#[async_trait]
impl ReactionsApi for ApiClient {
    async fn react(&self, target: ReactionTarget, is_positive: bool) -> anyhow::Result<()> {
        let body = serde_json::json!({ "isPositive": is_positive });
        self.post_empty(&target.reactions_path(), Some(&body)).await
    }

    async fn remove_reaction(&self, target: ReactionTarget) -> anyhow::Result<()> {
        let req = self.client.delete(self.url(&target.reactions_path()));
        self.apply_auth(req).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl CommentsApi for ApiClient {
    async fn comments_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        self.get_json(&format!("/api/posts/{post_id}/comments")).await
    }
}
