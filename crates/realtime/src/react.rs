// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optimistic reaction-state appliers.
//!
//! Pure value-type transitions: the UI applies the new state before the
//! network call resolves and, on failure, restores the pre-mutation
//! snapshot by plain assignment. At most one of the two flags is true
//! after any transition and the counters never underflow.

use crate::api::ReactionsApi;
use crate::models::ReactionTarget;

/// Client-side mirror of a post or comment's reaction tallies.
///
/// The flags are three-valued to match the backend: `None` means the
/// user never reacted, `Some(false)` means an earlier reaction was
/// withdrawn or overridden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionState {
    pub is_positive: Option<bool>,
    pub is_negative: Option<bool>,
    pub positive_count: u32,
    pub negative_count: u32,
}

/// The three reaction transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionAction {
    Clear,
    SetPositive,
    SetNegative,
}

/// Apply a reaction transition, returning the new state.
pub fn apply(state: ReactionState, action: ReactionAction) -> ReactionState {
    let mut next = state;
    match action {
        ReactionAction::Clear => {
            if state.is_positive == Some(true) {
                next.positive_count = state.positive_count.saturating_sub(1);
                next.is_positive = None;
            } else if state.is_negative == Some(true) {
                next.negative_count = state.negative_count.saturating_sub(1);
                next.is_negative = None;
            }
        }
        ReactionAction::SetPositive => {
            if state.is_negative == Some(true) {
                next.negative_count = state.negative_count.saturating_sub(1);
                next.positive_count = state.positive_count + 1;
            } else if state.is_positive != Some(true) {
                next.positive_count = state.positive_count + 1;
            }
            next.is_positive = Some(true);
            next.is_negative = Some(false);
        }
        ReactionAction::SetNegative => {
            if state.is_positive == Some(true) {
                next.positive_count = state.positive_count.saturating_sub(1);
                next.negative_count = state.negative_count + 1;
            } else if state.is_negative != Some(true) {
                next.negative_count = state.negative_count + 1;
            }
            next.is_negative = Some(true);
            next.is_positive = Some(false);
        }
    }
    next
}

/// Derive the action for a click on the positive or negative control.
///
/// Clicking the already-active direction withdraws the reaction.
pub fn action_for(state: ReactionState, positive: bool) -> ReactionAction {
    let active = if positive { state.is_positive } else { state.is_negative };
    if active == Some(true) {
        ReactionAction::Clear
    } else if positive {
        ReactionAction::SetPositive
    } else {
        ReactionAction::SetNegative
    }
}

/// Send the mutation matching an applied action.
pub async fn push(
    api: &dyn ReactionsApi,
    target: ReactionTarget,
    action: ReactionAction,
) -> anyhow::Result<()> {
    match action {
        ReactionAction::Clear => api.remove_reaction(target).await,
        ReactionAction::SetPositive => api.react(target, true).await,
        ReactionAction::SetNegative => api.react(target, false).await,
    }
}

/// Optimistic click handler: apply locally, call the backend, roll back
/// to the pre-mutation snapshot on failure. Returns the state to render.
pub async fn toggle(
    api: &dyn ReactionsApi,
    target: ReactionTarget,
    state: ReactionState,
    positive: bool,
) -> ReactionState {
    let snapshot = state;
    let action = action_for(state, positive);
    let next = apply(state, action);
    match push(api, target, action).await {
        Ok(()) => next,
        Err(e) => {
            tracing::debug!(err = %e, "reaction call failed, rolling back");
            snapshot
        }
    }
}

#[cfg(test)]
#[path = "react_tests.rs"]
mod tests;
