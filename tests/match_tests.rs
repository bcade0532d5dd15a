//! Match runner tests with mixed agents.

use std::sync::{Arc, Mutex};

use rust_boardgames::agent::{play_match, Agent, MatchOptions, RandomAgent};
use rust_boardgames::dfs::{DFSAgent, DFSConfig};
use rust_boardgames::games::{Nim, NimState, Take};
use rust_boardgames::mcts::{MCTSAgent, MCTSConfig};
use rust_boardgames::{Game, GameError, GameResult, Utility};

/// Wraps an agent and records every observed move.
struct Recording<A> {
    inner: A,
    seen: Arc<Mutex<Vec<Take>>>,
}

impl<A: Agent<Nim>> Agent<Nim> for Recording<A> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn decide(&mut self, state: &NimState) -> GameResult<Take> {
        self.inner.decide(state)
    }

    fn observe(&mut self, state: &NimState, mv: &Take, next: &NimState) {
        self.seen.lock().unwrap().push(*mv);
        self.inner.observe(state, mv, next);
    }
}

fn no_heuristic(game: &Nim, _state: &NimState) -> Utility {
    Utility::with_value(game.player_count(), 0.0)
}

#[test]
fn test_three_random_agents_finish_nim() {
    let game = Nim::new(3, 2);
    let mut agents: Vec<Box<dyn Agent<Nim>>> = (0..3)
        .map(|seed| Box::new(RandomAgent::new(game.clone(), seed)) as Box<dyn Agent<Nim>>)
        .collect();
    let record = play_match(&game, &game.initial_state(11), &mut agents, &MatchOptions::default()).unwrap();

    assert_eq!(record.moves.iter().map(|t| t.0).sum::<u32>(), 11);
    assert_eq!(record.final_state.stones, 0);
    assert_eq!(record.utility.total(), 1.0);
    assert_eq!(record.utility[record.final_state.last_mover.unwrap()], 1.0);
}

#[test]
fn test_every_agent_observes_every_move() {
    let game = Nim::new(2, 3);
    let seen_a = Arc::new(Mutex::new(Vec::new()));
    let seen_b = Arc::new(Mutex::new(Vec::new()));
    let mut agents: Vec<Box<dyn Agent<Nim>>> = vec![
        Box::new(Recording {
            inner: MCTSAgent::new(game.clone(), MCTSConfig::default().with_iterations(Some(50)))
                .unwrap(),
            seen: Arc::clone(&seen_a),
        }),
        Box::new(Recording {
            inner: DFSAgent::new(game.clone(), no_heuristic, DFSConfig::default().with_max_depth(6))
                .unwrap(),
            seen: Arc::clone(&seen_b),
        }),
    ];
    let record = play_match(&game, &game.initial_state(9), &mut agents, &MatchOptions::default()).unwrap();

    assert_eq!(*seen_a.lock().unwrap(), record.moves);
    assert_eq!(*seen_b.lock().unwrap(), record.moves);
}

#[test]
fn test_wrong_agent_count_is_rejected() {
    let game = Nim::new(3, 2);
    let mut agents: Vec<Box<dyn Agent<Nim>>> = vec![Box::new(RandomAgent::new(game.clone(), 0))];
    let err = play_match(&game, &game.initial_state(5), &mut agents, &MatchOptions::default()).unwrap_err();
    assert!(matches!(err, GameError::InvalidState(_)));
}

#[test]
fn test_move_limit_guards_long_matches() {
    let game = Nim::new(2, 1);
    let mut agents: Vec<Box<dyn Agent<Nim>>> = vec![
        Box::new(RandomAgent::new(game.clone(), 0)),
        Box::new(RandomAgent::new(game.clone(), 1)),
    ];
    let options = MatchOptions { max_moves: 5 };
    let err = play_match(&game, &game.initial_state(20), &mut agents, &options).unwrap_err();
    assert!(matches!(err, GameError::InvalidState(_)));
}
