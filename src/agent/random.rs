//! Uniform random agent.

use crate::core::GameRng;
use crate::error::{GameError, GameResult};
use crate::game::{playable_moves, Game};

use super::Agent;

/// Chooses uniformly among the playable moves.
pub struct RandomAgent<G: Game> {
    game: G,
    rng: GameRng,
    seed: u64,
}

impl<G: Game> RandomAgent<G> {
    pub fn new(game: G, seed: u64) -> Self {
        Self {
            game,
            rng: GameRng::new(seed),
            seed,
        }
    }
}

impl<G: Game> Agent<G> for RandomAgent<G> {
    fn name(&self) -> &str {
        "Random"
    }

    fn decide(&mut self, state: &G::State) -> GameResult<G::Move> {
        let moves = playable_moves(&self.game, state)?;
        self.rng
            .choose(&moves)
            .cloned()
            .ok_or(GameError::NoLegalMove)
    }

    fn reset(&mut self) {
        self.rng = GameRng::new(self.seed);
    }
}
