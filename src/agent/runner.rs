//! Minimal match runner: one agent per seat, turns until terminal.

use tracing::debug;

use crate::core::Utility;
use crate::error::{GameError, GameResult};
use crate::game::Game;

use super::Agent;

/// Limits for a single match.
#[derive(Clone, Debug)]
pub struct MatchOptions {
    /// Abort with `InvalidState` after this many moves.
    pub max_moves: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { max_moves: 10_000 }
    }
}

/// Outcome of a finished match.
#[derive(Clone, Debug)]
pub struct MatchRecord<G: Game> {
    pub moves: Vec<G::Move>,
    pub final_state: G::State,
    pub utility: Utility,
}

/// Play `initial` to termination.
///
/// Each turn asks the agent of `current_player` for a move, applies it, and
/// notifies every agent through [`Agent::observe`]. Agents are reset first.
pub fn play_match<G: Game>(
    game: &G,
    initial: &G::State,
    agents: &mut [Box<dyn Agent<G> + '_>],
    options: &MatchOptions,
) -> GameResult<MatchRecord<G>> {
    if agents.len() != game.player_count() {
        return Err(GameError::InvalidState(format!(
            "{} agents for a {}-player game",
            agents.len(),
            game.player_count()
        )));
    }
    for agent in agents.iter_mut() {
        agent.reset();
    }

    let mut state = initial.clone();
    let mut moves = Vec::new();
    while !game.is_terminal(&state) {
        if moves.len() >= options.max_moves {
            return Err(GameError::InvalidState(format!(
                "match exceeded {} moves",
                options.max_moves
            )));
        }
        let player = game.current_player(&state);
        let mv = agents[player.index()].decide(&state)?;
        let next = game.apply(&state, &mv)?;
        for agent in agents.iter_mut() {
            agent.observe(&state, &mv, &next);
        }
        moves.push(mv);
        state = next;
    }

    let utility = game.utility(&state)?;
    debug!(moves = moves.len(), utility = ?utility.as_slice(), "match finished");
    Ok(MatchRecord {
        moves,
        final_state: state,
        utility,
    })
}
