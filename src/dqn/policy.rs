//! Action selection over masked Q-values.
//!
//! Illegal actions are never selectable: every arg-max and every random draw
//! ranges over the legal action indices only.

use crate::core::GameRng;
use crate::error::{GameError, GameResult};
use crate::game::{playable_moves, Game};
use crate::nn::StateEncoder;

/// Legal action index with the highest value. Ties go to the earliest index
/// in `legal`; indices outside `values` are skipped and NaN never wins.
#[must_use]
pub fn masked_argmax(values: &[f32], legal: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for &action in legal {
        let Some(&value) = values.get(action) else {
            continue;
        };
        if value.is_nan() {
            if best.is_none() {
                best = Some((action, f32::NEG_INFINITY));
            }
            continue;
        }
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((action, value));
        }
    }
    best.map(|(action, _)| action)
}

/// Highest value among the legal action indices.
#[must_use]
pub fn masked_max(values: &[f32], legal: &[usize]) -> Option<f32> {
    masked_argmax(values, legal).map(|a| values[a])
}

/// With probability `epsilon` a uniformly random legal index, otherwise the
/// masked arg-max.
pub fn epsilon_greedy(
    values: &[f32],
    legal: &[usize],
    epsilon: f64,
    rng: &mut GameRng,
) -> Option<usize> {
    if legal.is_empty() {
        return None;
    }
    if epsilon > 0.0 && rng.gen_bool(epsilon.min(1.0)) {
        return rng.choose(legal).copied();
    }
    masked_argmax(values, legal)
}

/// Playable moves of `state` together with their action indices.
pub fn legal_actions<G: Game, E: StateEncoder<G> + ?Sized>(
    game: &G,
    encoder: &E,
    state: &G::State,
) -> GameResult<(Vec<G::Move>, Vec<usize>)> {
    let moves = playable_moves(game, state)?;
    let indices = moves
        .iter()
        .map(|mv| encoder.action_index(game, state, mv))
        .collect::<GameResult<Vec<_>>>()?;
    Ok((moves, indices))
}

/// Map a chosen action index back to its move.
pub fn move_for_action<M: Clone>(moves: &[M], indices: &[usize], action: usize) -> GameResult<M> {
    indices
        .iter()
        .position(|&i| i == action)
        .map(|pos| moves[pos].clone())
        .ok_or_else(|| GameError::IllegalMove(format!("action index {action} is not legal")))
}
