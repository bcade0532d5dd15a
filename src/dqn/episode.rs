//! Stepwise self-play episode shared by the serial and concurrent trainers.

use crate::core::{GameRng, PlayerId, Utility};
use crate::error::{GameError, GameResult};
use crate::game::Game;
use crate::nn::{QFunction, StateEncoder};
use crate::training::{ReplayEntry, ReplayPool, TransitionRecorder};

use super::policy::{epsilon_greedy, legal_actions, move_for_action};

/// Summary of one finished episode.
#[derive(Clone, Debug)]
pub struct EpisodeOutcome {
    pub moves: usize,
    pub utility: Utility,
}

/// One episode in progress: every seat is played by a Q-network with
/// epsilon-greedy exploration. Completed transitions are held back and
/// reach the pool only when [`EpisodeRunner::finish`] closes the episode,
/// so dropping an unfinished runner discards them.
pub struct EpisodeRunner<G: Game> {
    state: G::State,
    recorder: TransitionRecorder,
    pending: Vec<ReplayEntry>,
    moves: usize,
}

impl<G: Game> EpisodeRunner<G> {
    pub fn new(game: &G, initial: &G::State) -> Self {
        Self {
            state: initial.clone(),
            recorder: TransitionRecorder::new(game.player_count()),
            pending: Vec::new(),
            moves: 0,
        }
    }

    pub fn is_done(&self, game: &G) -> bool {
        game.is_terminal(&self.state)
    }

    pub fn to_move(&self, game: &G) -> PlayerId {
        game.current_player(&self.state)
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Transitions completed so far and not yet committed.
    pub fn pending(&self) -> &[ReplayEntry] {
        &self.pending
    }

    /// Play one move for the seat to act using `net`.
    pub fn step<E, Q>(
        &mut self,
        game: &G,
        encoder: &E,
        net: &Q,
        epsilon: f64,
        rng: &mut GameRng,
    ) -> GameResult<()>
    where
        E: StateEncoder<G> + ?Sized,
        Q: QFunction + ?Sized,
    {
        let player = game.current_player(&self.state);
        let (moves, legal) = legal_actions(game, encoder, &self.state)?;
        let encoded = encoder.encode(game, &self.state, player);
        let values = net.predict(&encoded);
        let action = epsilon_greedy(&values, &legal, epsilon, rng).ok_or(GameError::NoLegalMove)?;
        let mv = move_for_action(&moves, &legal, action)?;

        if let Some(entry) = self.recorder.act(player, encoded, legal, action) {
            self.pending.push(entry);
        }
        self.state = game.apply(&self.state, &mv)?;
        self.moves += 1;
        Ok(())
    }

    /// Close the episode on its terminal state and commit all of its
    /// transitions, including the last one of every seat.
    pub fn finish<E: StateEncoder<G> + ?Sized>(
        mut self,
        game: &G,
        encoder: &E,
        pool: &ReplayPool,
    ) -> GameResult<EpisodeOutcome> {
        let utility = game.utility(&self.state)?;
        let state = &self.state;
        let last = self
            .recorder
            .finish(&utility, |p| encoder.encode(game, state, p));
        for entry in self.pending.drain(..).chain(last) {
            pool.push(entry);
        }
        Ok(EpisodeOutcome {
            moves: self.moves,
            utility,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::games::{Nim, NimEncoder};
    use crate::nn::LinearQFunction;
    use crate::training::ReplaySharing;

    #[test]
    fn test_episode_records_every_move() {
        let game = Nim::new(2, 3);
        let encoder = NimEncoder::new(&game, 10);
        let net = LinearQFunction::new(encoder.feature_count(), encoder.action_count(), 1);
        let pool = ReplayPool::new(ReplaySharing::PerPlayer, 2, 100);
        let mut rng = GameRng::new(2);

        let mut runner = EpisodeRunner::new(&game, &game.initial_state(10));
        while !runner.is_done(&game) {
            runner.step(&game, &encoder, &net, 1.0, &mut rng).unwrap();
        }
        assert_eq!(pool.total_len(), 0);
        assert_eq!(runner.pending().len(), runner.moves() - 2);
        let moves = runner.moves();
        let outcome = runner.finish(&game, &encoder, &pool).unwrap();

        assert_eq!(outcome.moves, moves);
        assert_eq!(pool.total_len(), moves);
        assert_eq!(outcome.utility.total(), 1.0);

        // Each seat's last entry is terminal and carries its utility.
        for seat in 0..2u8 {
            let player = PlayerId::new(seat);
            let entries = pool.buffer_for(player).to_vec();
            let last = entries.last().unwrap();
            assert!(last.done);
            assert_eq!(last.reward, outcome.utility[player]);
            assert!(entries[..entries.len() - 1].iter().all(|e| !e.done && e.reward == 0.0));
        }
    }
}
