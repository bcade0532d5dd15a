//! The `Game` contract.
//!
//! A game is a stateless rules descriptor: every operation takes the state by
//! reference and returns new values. Agents are written once against this
//! trait and work for any number of players.

use std::fmt::Debug;
use std::hash::Hash;

use crate::core::{PlayerId, Utility};
use crate::error::{GameError, GameResult};

/// Rules of a turn-based, perfect-information, N-player game.
///
/// ## Implementation Notes
///
/// - `legal_moves` must enumerate moves in a fixed order; search tie-breaks
///   depend on it.
/// - `legal_moves` fails with [`GameError::InvalidState`] on terminal states.
/// - `apply` fails with [`GameError::IllegalMove`] for moves outside
///   `legal_moves(state)` and never mutates its input.
/// - `utility` fails with [`GameError::NotTerminal`] on non-terminal states and
///   returns one reward per player.
/// - A game whose non-terminal states may have no ordinary move defines a
///   pass move through [`Game::pass_move`]; otherwise such a state is invalid.
pub trait Game: Clone + Send + Sync {
    /// Immutable position snapshot. Equal states must have the same legal
    /// moves and the same utility.
    type State: Clone + Eq + Hash + Debug + Send + Sync;

    /// Opaque action descriptor, valid only for the state it came from.
    type Move: Clone + Eq + Hash + Debug + Send + Sync;

    /// Number of seats. Constant for a given game.
    fn player_count(&self) -> usize;

    /// Legal moves in a fixed enumeration order.
    fn legal_moves(&self, state: &Self::State) -> GameResult<Vec<Self::Move>>;

    /// Successor state after `mv`.
    fn apply(&self, state: &Self::State, mv: &Self::Move) -> GameResult<Self::State>;

    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Per-player rewards of a terminal state.
    fn utility(&self, state: &Self::State) -> GameResult<Utility>;

    /// Seat to act in `state`.
    fn current_player(&self, state: &Self::State) -> PlayerId;

    /// Pass move used when a non-terminal state has no ordinary legal move.
    ///
    /// The default forbids passing: such a state is reported as invalid.
    fn pass_move(&self, _state: &Self::State) -> Option<Self::Move> {
        None
    }
}

/// Moves an agent may choose from in `state`.
///
/// - terminal state: [`GameError::NoLegalMove`]
/// - legal moves present: those moves
/// - none, but the game defines a pass move: `[pass]`
/// - none and no pass move: [`GameError::InvalidState`]
pub fn playable_moves<G: Game>(game: &G, state: &G::State) -> GameResult<Vec<G::Move>> {
    if game.is_terminal(state) {
        return Err(GameError::NoLegalMove);
    }

    let moves = game.legal_moves(state)?;
    if !moves.is_empty() {
        return Ok(moves);
    }

    match game.pass_move(state) {
        Some(pass) => Ok(vec![pass]),
        None => Err(GameError::InvalidState(format!(
            "non-terminal state {state:?} has no legal moves and the game forbids passing"
        ))),
    }
}

/// Helper for `Game::apply` implementations: reject moves not in
/// `legal_moves(state)` (or the pass move when it is the only option).
pub fn check_legal<G: Game>(game: &G, state: &G::State, mv: &G::Move) -> GameResult<()> {
    if game.is_terminal(state) {
        return Err(GameError::IllegalMove(format!(
            "{mv:?} applied to terminal state {state:?}"
        )));
    }
    let moves = playable_moves(game, state)?;
    if moves.contains(mv) {
        Ok(())
    } else {
        Err(GameError::IllegalMove(format!("{mv:?} in state {state:?}")))
    }
}

/// Validate a reward vector produced outside the game (evaluators).
pub fn check_utility_len<G: Game>(game: &G, utility: &Utility) -> GameResult<()> {
    if utility.player_count() == game.player_count() {
        Ok(())
    } else {
        Err(GameError::InvalidState(format!(
            "reward vector has {} entries, game has {} players",
            utility.player_count(),
            game.player_count()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counter game: players add 1 until 3; at 2 the mover has no ordinary
    /// move and may pass when `allow_pass` is set.
    #[derive(Clone)]
    struct Counter {
        allow_pass: bool,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    enum Step {
        Add,
        Pass,
    }

    impl Game for Counter {
        type State = (u8, bool);
        type Move = Step;

        fn player_count(&self) -> usize {
            2
        }

        fn legal_moves(&self, state: &(u8, bool)) -> GameResult<Vec<Step>> {
            if self.is_terminal(state) {
                return Err(GameError::InvalidState("terminal".into()));
            }
            Ok(if state.0 == 2 && !state.1 { vec![] } else { vec![Step::Add] })
        }

        fn apply(&self, state: &(u8, bool), mv: &Step) -> GameResult<(u8, bool)> {
            check_legal(self, state, mv)?;
            Ok(match mv {
                Step::Add => (state.0 + 1, state.1),
                Step::Pass => (state.0, true),
            })
        }

        fn is_terminal(&self, state: &(u8, bool)) -> bool {
            state.0 >= 3
        }

        fn utility(&self, state: &(u8, bool)) -> GameResult<Utility> {
            if !self.is_terminal(state) {
                return Err(GameError::NotTerminal);
            }
            Ok(Utility::from_vec(vec![1.0, 0.0]))
        }

        fn current_player(&self, state: &(u8, bool)) -> PlayerId {
            PlayerId::new(state.0 % 2)
        }

        fn pass_move(&self, _state: &(u8, bool)) -> Option<Step> {
            self.allow_pass.then_some(Step::Pass)
        }
    }

    #[test]
    fn test_playable_moves_terminal() {
        let game = Counter { allow_pass: false };
        assert_eq!(playable_moves(&game, &(3, false)), Err(GameError::NoLegalMove));
    }

    #[test]
    fn test_playable_moves_pass_policy() {
        let strict = Counter { allow_pass: false };
        assert!(matches!(
            playable_moves(&strict, &(2, false)),
            Err(GameError::InvalidState(_))
        ));

        let lenient = Counter { allow_pass: true };
        assert_eq!(playable_moves(&lenient, &(2, false)), Ok(vec![Step::Pass]));
        assert_eq!(lenient.apply(&(2, false), &Step::Pass), Ok((2, true)));
    }

    #[test]
    fn test_check_legal_rejects_foreign_move() {
        let game = Counter { allow_pass: true };
        assert!(matches!(
            game.apply(&(0, false), &Step::Pass),
            Err(GameError::IllegalMove(_))
        ));
        assert!(matches!(
            game.apply(&(3, false), &Step::Add),
            Err(GameError::IllegalMove(_))
        ));
    }

    #[test]
    fn test_check_utility_len() {
        let game = Counter { allow_pass: false };
        assert!(check_utility_len(&game, &Utility::with_value(2, 0.0)).is_ok());
        assert!(check_utility_len(&game, &Utility::with_value(3, 0.0)).is_err());
    }
}
