// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polling stores: notifications and the message-unread aggregate.
//!
//! Deliberately redundant with the push transport — either side keeps
//! working when the other is down.

pub mod store;
pub mod unread;

pub use store::{NotificationSnapshot, NotificationStore};
pub use unread::UnreadMessages;

use tokio_util::sync::CancellationToken;

/// Handle on a running poll timer.
pub(crate) struct TimerHandle {
    pub cancel: CancellationToken,
    pub task: tokio::task::JoinHandle<()>,
}

impl TimerHandle {
    pub fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}
