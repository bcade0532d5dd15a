//! `Agent` wrapper around [`MCTSSearch`].

use crate::agent::Agent;
use crate::error::{ConfigError, GameResult};
use crate::game::Game;

use super::config::MCTSConfig;
use super::search::MCTSSearch;
use super::stats::SearchStats;

/// N-player UCT agent.
///
/// With `retain_tree_across_turns` the agent follows every committed move
/// (its own and the opponents') through [`Agent::observe`] and reuses the
/// matching subtree on its next turn.
pub struct MCTSAgent<G: Game> {
    search: MCTSSearch<G>,
    name: String,
}

impl<G: Game> MCTSAgent<G> {
    pub fn new(game: G, config: MCTSConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_search(MCTSSearch::new(game, config)?))
    }

    /// Wrap a search with custom policies.
    pub fn from_search(search: MCTSSearch<G>) -> Self {
        let config = search.config();
        let name = match (config.iteration_budget, config.time_budget_ms) {
            (Some(n), _) => format!("MCTS({n} iterations)"),
            (None, Some(ms)) => format!("MCTS({ms} ms)"),
            (None, None) => "MCTS".to_string(),
        };
        Self { search, name }
    }

    pub fn search(&self) -> &MCTSSearch<G> {
        &self.search
    }

    pub fn last_stats(&self) -> &SearchStats {
        self.search.stats()
    }
}

impl<G: Game> Agent<G> for MCTSAgent<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &G::State) -> GameResult<G::Move> {
        self.search.search(state)
    }

    fn observe(&mut self, _state: &G::State, mv: &G::Move, next: &G::State) {
        self.search.advance(mv, next);
    }

    fn reset(&mut self) {
        self.search.reset();
    }
}
