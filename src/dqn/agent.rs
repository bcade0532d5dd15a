//! Inference-side DQN agent.

use std::path::Path;

use crate::agent::Agent;
use crate::core::GameRng;
use crate::error::{CheckpointError, GameError, GameResult};
use crate::game::Game;
use crate::nn::{QFunction, StateEncoder};

use super::checkpoint::Checkpoint;
use super::policy::{epsilon_greedy, legal_actions, move_for_action};

/// Plays with a trained Q-function: greedy, or epsilon-greedy with a fixed
/// epsilon. Values are always masked to the legal actions.
pub struct DQNAgent<G: Game, E: StateEncoder<G>, Q: QFunction> {
    game: G,
    encoder: E,
    q: Q,
    epsilon: f64,
    rng: GameRng,
    seed: u64,
}

impl<G: Game, E: StateEncoder<G>, Q: QFunction> DQNAgent<G, E, Q> {
    /// Greedy agent.
    pub fn new(game: G, encoder: E, q: Q) -> Self {
        Self {
            game,
            encoder,
            q,
            epsilon: 0.0,
            rng: GameRng::new(0),
            seed: 0,
        }
    }

    /// Load network `index` of a checkpoint into `q` (whose shape must match).
    pub fn from_checkpoint(
        game: G,
        encoder: E,
        mut q: Q,
        path: impl AsRef<Path>,
        index: usize,
    ) -> Result<Self, CheckpointError> {
        let checkpoint = Checkpoint::load(path)?;
        checkpoint.restore_into(index, &mut q)?;
        Ok(Self::new(game, encoder, q))
    }

    /// Explore with a fixed probability, seeded for reproducibility.
    pub fn with_epsilon(mut self, epsilon: f64, seed: u64) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self.rng = GameRng::new(seed);
        self.seed = seed;
        self
    }

    pub fn q_function(&self) -> &Q {
        &self.q
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Masked Q-values of the playable moves, in enumeration order.
    pub fn move_values(&self, state: &G::State) -> GameResult<Vec<(G::Move, f32)>> {
        let (moves, legal) = legal_actions(&self.game, &self.encoder, state)?;
        let encoded = self
            .encoder
            .encode(&self.game, state, self.game.current_player(state));
        let values = self.q.predict(&encoded);
        Ok(moves
            .into_iter()
            .zip(legal)
            .map(|(mv, a)| (mv, values.get(a).copied().unwrap_or(f32::NEG_INFINITY)))
            .collect())
    }
}

impl<G: Game, E: StateEncoder<G>, Q: QFunction> Agent<G> for DQNAgent<G, E, Q> {
    fn name(&self) -> &str {
        "DQN"
    }

    fn decide(&mut self, state: &G::State) -> GameResult<G::Move> {
        let (moves, legal) = legal_actions(&self.game, &self.encoder, state)?;
        let player = self.game.current_player(state);
        let values = self.q.predict(&self.encoder.encode(&self.game, state, player));
        let action = epsilon_greedy(&values, &legal, self.epsilon, &mut self.rng)
            .ok_or(GameError::NoLegalMove)?;
        move_for_action(&moves, &legal, action)
    }

    fn reset(&mut self) {
        self.rng = GameRng::new(self.seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{Nim, NimEncoder, Take};
    use crate::core::PlayerId;
    use crate::nn::{LinearQFunction, TrainingSample};

    #[test]
    fn test_greedy_agent_never_picks_illegal_action() {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let mut q = LinearQFunction::zeros(encoder.feature_count(), encoder.action_count());
        // Make "take 3" by far the best action everywhere.
        let batch: Vec<TrainingSample> = (1..=10)
            .map(|stones| TrainingSample {
                input: encoder.encode(&game, &game.initial_state(stones), PlayerId::new(0)),
                action: 2,
                target: 5.0,
            })
            .collect();
        for _ in 0..50 {
            q.train(&batch, 0.05);
        }

        let mut agent = DQNAgent::new(game.clone(), encoder, q);
        assert_eq!(agent.decide(&game.initial_state(9)).unwrap(), Take(3));
        // Only 1 or 2 are legal with two stones left.
        let mv = agent.decide(&game.initial_state(2)).unwrap();
        assert!(mv == Take(1) || mv == Take(2));
        assert_eq!(agent.move_values(&game.initial_state(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_epsilon_agent_is_seeded() {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let q = LinearQFunction::new(encoder.feature_count(), encoder.action_count(), 3);
        let mut a = DQNAgent::new(game.clone(), encoder.clone(), q.clone()).with_epsilon(0.5, 8);
        let mut b = DQNAgent::new(game.clone(), encoder, q).with_epsilon(0.5, 8);

        let state = game.initial_state(10);
        let first: Vec<Take> = (0..30).map(|_| a.decide(&state).unwrap()).collect();
        let second: Vec<Take> = (0..30).map(|_| b.decide(&state).unwrap()).collect();
        assert_eq!(first, second);

        a.reset();
        let replay: Vec<Take> = (0..30).map(|_| a.decide(&state).unwrap()).collect();
        assert_eq!(first, replay);
    }
}
