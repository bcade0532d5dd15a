//! N-player subtraction Nim.
//!
//! Players take turns removing between 1 and `max_take` stones from a single
//! pile; whoever takes the last stone scores 1, everyone else 0. Small enough
//! to solve exactly, long enough to exercise multi-step rollouts and
//! self-play training.

use crate::core::{PlayerId, Utility};
use crate::error::{GameError, GameResult};
use crate::game::{check_legal, Game};
use crate::nn::{EncodedState, StateEncoder};

/// Take this many stones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Take(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NimState {
    pub stones: u32,
    pub to_move: PlayerId,
    /// Seat that made the last move; the winner once the pile is empty.
    pub last_mover: Option<PlayerId>,
}

#[derive(Clone, Debug)]
pub struct Nim {
    players: usize,
    max_take: u32,
}

impl Nim {
    pub fn new(players: usize, max_take: u32) -> Self {
        Self {
            players: players.max(1),
            max_take: max_take.max(1),
        }
    }

    #[must_use]
    pub fn initial_state(&self, stones: u32) -> NimState {
        NimState {
            stones,
            to_move: PlayerId::new(0),
            last_mover: None,
        }
    }

    #[must_use]
    pub fn max_take(&self) -> u32 {
        self.max_take
    }
}

impl Game for Nim {
    type State = NimState;
    type Move = Take;

    fn player_count(&self) -> usize {
        self.players
    }

    fn legal_moves(&self, state: &NimState) -> GameResult<Vec<Take>> {
        if state.stones == 0 {
            return Err(GameError::InvalidState("pile is empty".into()));
        }
        Ok((1..=self.max_take.min(state.stones)).map(Take).collect())
    }

    fn apply(&self, state: &NimState, mv: &Take) -> GameResult<NimState> {
        check_legal(self, state, mv)?;
        Ok(NimState {
            stones: state.stones - mv.0,
            to_move: state.to_move.next(self.players),
            last_mover: Some(state.to_move),
        })
    }

    fn is_terminal(&self, state: &NimState) -> bool {
        state.stones == 0
    }

    fn utility(&self, state: &NimState) -> GameResult<Utility> {
        if state.stones > 0 {
            return Err(GameError::NotTerminal);
        }
        let winner = state.last_mover.ok_or_else(|| {
            GameError::InvalidState("empty pile with no move played".into())
        })?;
        Ok(Utility::new(self.players, |p| if p == winner { 1.0 } else { 0.0 }))
    }

    fn current_player(&self, state: &NimState) -> PlayerId {
        state.to_move
    }
}

/// One-hot pile size (up to `max_stones`) plus a one-hot perspective seat.
#[derive(Clone, Debug)]
pub struct NimEncoder {
    max_stones: u32,
    players: usize,
    max_take: u32,
}

impl NimEncoder {
    pub fn new(game: &Nim, max_stones: u32) -> Self {
        Self {
            max_stones,
            players: game.player_count(),
            max_take: game.max_take(),
        }
    }
}

impl StateEncoder<Nim> for NimEncoder {
    fn encode(&self, _game: &Nim, state: &NimState, perspective: PlayerId) -> EncodedState {
        let mut features = vec![0.0; self.feature_count()];
        features[state.stones.min(self.max_stones) as usize] = 1.0;
        features[self.max_stones as usize + 1 + perspective.index() % self.players] = 1.0;
        EncodedState::flat(features)
    }

    fn feature_count(&self) -> usize {
        self.max_stones as usize + 1 + self.players
    }

    fn action_count(&self) -> usize {
        self.max_take as usize
    }

    fn action_index(&self, _game: &Nim, _state: &NimState, mv: &Take) -> GameResult<usize> {
        if mv.0 == 0 || mv.0 > self.max_take {
            return Err(GameError::IllegalMove(format!("{mv:?} outside action space")));
        }
        Ok(mv.0 as usize - 1)
    }
}
