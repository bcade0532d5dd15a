//! State and action encoding for function approximators.
//!
//! Moves are opaque to the learning agents, so every game used with a
//! Q-function supplies an encoder that fixes:
//! - the feature vector of a state from one player's perspective
//! - the size of the action space
//! - the index of each legal move within that space

use crate::core::PlayerId;
use crate::error::GameResult;
use crate::game::Game;
use crate::nn::traits::EncodedState;

pub trait StateEncoder<G: Game>: Send + Sync {
    /// Encode `state` as seen by `perspective`.
    fn encode(&self, game: &G, state: &G::State, perspective: PlayerId) -> EncodedState;

    /// Length of every encoded feature vector.
    fn feature_count(&self) -> usize;

    /// Number of action indices (Q-function output size).
    fn action_count(&self) -> usize;

    /// Index of `mv` in the action space. Distinct legal moves of one state
    /// must map to distinct indices below `action_count()`.
    fn action_index(&self, game: &G, state: &G::State, mv: &G::Move) -> GameResult<usize>;
}
