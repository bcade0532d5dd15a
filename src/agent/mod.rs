//! The `Agent` contract and the match runner.
//!
//! Agents are composed at runtime as `Box<dyn Agent<G>>`, one per seat, and
//! share nothing beyond this trait.

mod random;
mod runner;

pub use random::RandomAgent;
pub use runner::{play_match, MatchOptions, MatchRecord};

use crate::error::GameResult;
use crate::game::Game;

/// A decision function over game states.
///
/// Agents may keep internal state between calls (search trees, models) but
/// treat the `State` they are given as read-only.
pub trait Agent<G: Game> {
    /// Display name for logs and match reports.
    fn name(&self) -> &str;

    /// Choose a move for the player to act in `state`.
    ///
    /// Returns an element of [`playable_moves`](crate::game::playable_moves)
    /// or [`GameError::NoLegalMove`](crate::error::GameError::NoLegalMove) on
    /// a terminal state.
    fn decide(&mut self, state: &G::State) -> GameResult<G::Move>;

    /// Called after any seat's move is committed to the real game.
    fn observe(&mut self, _state: &G::State, _mv: &G::Move, _next: &G::State) {}

    /// Forget per-match state before a new match.
    fn reset(&mut self) {}
}

impl<G: Game, A: Agent<G> + ?Sized> Agent<G> for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn decide(&mut self, state: &G::State) -> GameResult<G::Move> {
        (**self).decide(state)
    }

    fn observe(&mut self, state: &G::State, mv: &G::Move, next: &G::State) {
        (**self).observe(state, mv, next);
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}
