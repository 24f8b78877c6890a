// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Activity-log mapping for the profile feed.
//!
//! Raw log entries are heterogeneous; the kind is resolved best-effort
//! through a fallback pipeline (explicit field, then URL pattern, then
//! description text) and entries that resolve to nothing are dropped
//! rather than guessed at. A comment entry whose link lacks the comment
//! anchor can be enriched asynchronously by correlating the entry
//! timestamp against the author's own comments on the target post; an
//! existing anchor is never replaced.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::CommentsApi;

/// How far (seconds) a comment's creation time may drift from the log
/// timestamp and still be treated as the same event.
const ANCHOR_WINDOW_SECS: i64 = 90;

/// What a raw activity-log entry turned out to describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Post,
    Comment,
    Reaction,
}

/// Link from a feed item into the forum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeepLink {
    pub post_id: Uuid,
    pub comment_id: Option<Uuid>,
}

/// Raw heterogeneous activity-log entry as the backend reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub id: Uuid,
    #[serde(default)]
    pub kind: Option<String>,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Normalized entry for the activity view.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub id: Uuid,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub kind: FeedKind,
    pub link: Option<DeepLink>,
}

/// Compiled matching patterns for the mapping pipeline.
pub struct FeedPatterns {
    post_url: Regex,
    comment_anchor: Regex,
    commented: Regex,
    reacted: Regex,
    posted: Regex,
}

impl FeedPatterns {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            post_url: Regex::new(r"/posts/([0-9a-fA-F-]{36})")?,
            comment_anchor: Regex::new(r"#comment-([0-9a-fA-F-]{36})")?,
            commented: Regex::new(r"(?i)\bcommented on\b")?,
            reacted: Regex::new(r"(?i)\b(liked|disliked|reacted to)\b")?,
            posted: Regex::new(r"(?i)\b(created|published)\b.*\bpost\b")?,
        })
    }

    /// Map a raw record to a feed item, or `None` when no kind resolves.
    pub fn map_record(&self, record: &ActivityRecord) -> Option<FeedItem> {
        let kind = kind_from_field(record.kind.as_deref())
            .or_else(|| record.url.as_deref().and_then(|url| self.kind_from_url(url)))
            .or_else(|| self.kind_from_description(&record.description))?;
        let link = record.url.as_deref().and_then(|url| self.parse_deep_link(url));
        Some(FeedItem {
            id: record.id,
            label: record.description.clone(),
            timestamp: record.created_at,
            kind,
            link,
        })
    }

    /// Extract the post (and optional comment anchor) a URL points at.
    pub fn parse_deep_link(&self, url: &str) -> Option<DeepLink> {
        let caps = self.post_url.captures(url)?;
        let post_id = Uuid::parse_str(caps.get(1)?.as_str()).ok()?;
        let comment_id = self
            .comment_anchor
            .captures(url)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Uuid::parse_str(m.as_str()).ok());
        Some(DeepLink { post_id, comment_id })
    }

    fn kind_from_url(&self, url: &str) -> Option<FeedKind> {
        let link = self.parse_deep_link(url)?;
        Some(if link.comment_id.is_some() { FeedKind::Comment } else { FeedKind::Post })
    }

    fn kind_from_description(&self, text: &str) -> Option<FeedKind> {
        if self.commented.is_match(text) {
            Some(FeedKind::Comment)
        } else if self.reacted.is_match(text) {
            Some(FeedKind::Reaction)
        } else if self.posted.is_match(text) {
            Some(FeedKind::Post)
        } else {
            None
        }
    }
}

fn kind_from_field(kind: Option<&str>) -> Option<FeedKind> {
    match kind?.to_ascii_lowercase().as_str() {
        "post" => Some(FeedKind::Post),
        "comment" => Some(FeedKind::Comment),
        "reaction" => Some(FeedKind::Reaction),
        _ => None,
    }
}

/// Fill in a missing comment anchor on a comment feed item.
///
/// Looks up the author's own comments on the linked post and takes the
/// one whose creation time is nearest the log timestamp, within
/// [`ANCHOR_WINDOW_SECS`]; ties resolve to the earliest. An item that
/// already carries an anchor, or is not a comment, is left untouched.
pub async fn enrich_comment_anchor(api: &dyn CommentsApi, author_id: &str, item: &mut FeedItem) {
    if item.kind != FeedKind::Comment {
        return;
    }
    let Some(link) = item.link.as_mut() else { return };
    if link.comment_id.is_some() {
        return;
    }
    let comments = match api.comments_for_post(link.post_id).await {
        Ok(comments) => comments,
        Err(e) => {
            tracing::debug!(post_id = %link.post_id, err = %e, "comment lookup failed");
            return;
        }
    };
    let best = comments
        .iter()
        .filter(|c| c.author_id == author_id)
        .filter_map(|c| {
            let drift = (c.created_at - item.timestamp).num_seconds().abs();
            (drift <= ANCHOR_WINDOW_SECS).then_some((drift, c))
        })
        .min_by_key(|(drift, c)| (*drift, c.created_at));
    if let Some((_, comment)) = best {
        link.comment_id = Some(comment.id);
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
