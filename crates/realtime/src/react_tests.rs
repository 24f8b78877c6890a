// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use uuid::Uuid;

use super::*;

fn state(
    is_positive: Option<bool>,
    is_negative: Option<bool>,
    positive_count: u32,
    negative_count: u32,
) -> ReactionState {
    ReactionState { is_positive, is_negative, positive_count, negative_count }
}

// ── single transitions ────────────────────────────────────────────────

#[yare::parameterized(
    clear_when_liked      = { state(Some(true), None, 5, 2), ReactionAction::Clear,
                              state(None, None, 4, 2) },
    clear_when_disliked   = { state(None, Some(true), 5, 2), ReactionAction::Clear,
                              state(None, None, 5, 1) },
    clear_when_neutral    = { state(None, None, 5, 2), ReactionAction::Clear,
                              state(None, None, 5, 2) },
    like_from_neutral     = { state(None, None, 5, 2), ReactionAction::SetPositive,
                              state(Some(true), Some(false), 6, 2) },
    like_when_liked       = { state(Some(true), Some(false), 6, 2), ReactionAction::SetPositive,
                              state(Some(true), Some(false), 6, 2) },
    like_when_disliked    = { state(Some(false), Some(true), 5, 3), ReactionAction::SetPositive,
                              state(Some(true), Some(false), 6, 2) },
    dislike_from_neutral  = { state(None, None, 5, 2), ReactionAction::SetNegative,
                              state(Some(false), Some(true), 5, 3) },
    dislike_when_liked    = { state(Some(true), Some(false), 6, 2), ReactionAction::SetNegative,
                              state(Some(false), Some(true), 5, 3) },
    dislike_when_disliked = { state(Some(false), Some(true), 5, 3), ReactionAction::SetNegative,
                              state(Some(false), Some(true), 5, 3) },
    clear_floors_at_zero  = { state(Some(true), None, 0, 0), ReactionAction::Clear,
                              state(None, None, 0, 0) },
)]
fn transition(start: ReactionState, action: ReactionAction, want: ReactionState) {
    assert_eq!(apply(start, action), want);
}

// ── the documented click sequence ─────────────────────────────────────

#[test]
fn like_like_dislike_clear_sequence() {
    let start = state(None, None, 5, 2);

    let liked = apply(start, ReactionAction::SetPositive);
    assert_eq!(liked, state(Some(true), Some(false), 6, 2));

    // Liking again is a no-op: already liked.
    let liked_again = apply(liked, ReactionAction::SetPositive);
    assert_eq!(liked_again, liked);

    let disliked = apply(liked_again, ReactionAction::SetNegative);
    assert_eq!(disliked, state(Some(false), Some(true), 5, 3));

    let cleared = apply(disliked, ReactionAction::Clear);
    assert_eq!(cleared.negative_count, 2);
    assert_eq!(cleared.positive_count, 5);
    assert_eq!(cleared.is_negative, None);
}

// ── click-to-action derivation ────────────────────────────────────────

#[yare::parameterized(
    like_while_liked       = { state(Some(true), Some(false), 1, 0), true,  ReactionAction::Clear },
    like_while_neutral     = { state(None, None, 0, 0),              true,  ReactionAction::SetPositive },
    like_while_disliked    = { state(Some(false), Some(true), 0, 1), true,  ReactionAction::SetPositive },
    dislike_while_disliked = { state(Some(false), Some(true), 0, 1), false, ReactionAction::Clear },
    dislike_while_neutral  = { state(None, None, 0, 0),              false, ReactionAction::SetNegative },
    dislike_while_liked    = { state(Some(true), Some(false), 1, 0), false, ReactionAction::SetNegative },
)]
fn click_derivation(current: ReactionState, positive: bool, want: ReactionAction) {
    assert_eq!(action_for(current, positive), want);
}

// ── invariants over arbitrary sequences ───────────────────────────────

fn arb_state() -> impl Strategy<Value = ReactionState> {
    (0u32..500, 0u32..500, 0u8..4).prop_map(|(positive_count, negative_count, flags)| {
        let (is_positive, is_negative) = match flags {
            0 => (None, None),
            1 => (Some(true), Some(false)),
            2 => (Some(false), Some(true)),
            _ => (Some(false), Some(false)),
        };
        ReactionState { is_positive, is_negative, positive_count, negative_count }
    })
}

fn arb_action() -> impl Strategy<Value = ReactionAction> {
    prop_oneof![
        Just(ReactionAction::Clear),
        Just(ReactionAction::SetPositive),
        Just(ReactionAction::SetNegative),
    ]
}

proptest! {
    #[test]
    fn at_most_one_flag_true_after_any_sequence(
        start in arb_state(),
        actions in proptest::collection::vec(arb_action(), 0..32),
    ) {
        let mut current = start;
        for action in actions {
            current = apply(current, action);
            prop_assert!(
                !(current.is_positive == Some(true) && current.is_negative == Some(true))
            );
        }
    }

    #[test]
    fn counters_track_flag_deltas(
        start in arb_state(),
        action in arb_action(),
    ) {
        let next = apply(start, action);
        // A single transition moves each counter by at most one.
        let dp = i64::from(next.positive_count) - i64::from(start.positive_count);
        let dn = i64::from(next.negative_count) - i64::from(start.negative_count);
        prop_assert!(dp.abs() <= 1 && dn.abs() <= 1);
    }
}

// ── optimistic toggle with rollback ───────────────────────────────────

struct StubReactions {
    fail: AtomicBool,
}

#[async_trait]
impl crate::api::ReactionsApi for StubReactions {
    async fn react(&self, _target: ReactionTarget, _is_positive: bool) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("boom");
        }
        Ok(())
    }

    async fn remove_reaction(&self, _target: ReactionTarget) -> anyhow::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("boom");
        }
        Ok(())
    }
}

#[tokio::test]
async fn toggle_keeps_the_optimistic_state_on_success() {
    let api = Arc::new(StubReactions { fail: AtomicBool::new(false) });
    let target = ReactionTarget::Post(Uuid::new_v4());

    let settled = toggle(api.as_ref(), target, state(None, None, 5, 2), true).await;
    assert_eq!(settled, state(Some(true), Some(false), 6, 2));
}

#[tokio::test]
async fn toggle_rolls_back_to_the_snapshot_on_failure() {
    let api = Arc::new(StubReactions { fail: AtomicBool::new(true) });
    let target = ReactionTarget::Comment(Uuid::new_v4());
    let before = state(Some(false), Some(true), 5, 3);

    let settled = toggle(api.as_ref(), target, before, true).await;
    assert_eq!(settled, before, "full snapshot restore, not a recomputation");
}
