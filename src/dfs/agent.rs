//! `Agent` wrapper around [`DFSSearch`].

use crate::agent::Agent;
use crate::core::CancelToken;
use crate::error::{ConfigError, GameError, GameResult};
use crate::game::Game;

use super::config::{DFSConfig, SearchMode};
use super::evaluator::Evaluator;
use super::search::{DFSSearch, DFSStats};
use super::transposition::TranspositionTable;

/// Depth-first agent (max-n or paranoid) with a per-game evaluator.
///
/// The transposition table, when configured, lives as long as the agent so
/// later decisions are ordered by what earlier ones learned.
pub struct DFSAgent<G: Game> {
    game: G,
    evaluator: Box<dyn Evaluator<G>>,
    config: DFSConfig,
    cancel: Option<CancelToken>,
    table: Option<TranspositionTable<G::State>>,
    depth_sum: u64,
    decisions: u64,
    last_stats: Option<DFSStats<G::Move>>,
    name: String,
}

impl<G: Game> DFSAgent<G> {
    pub fn new(
        game: G,
        evaluator: impl Evaluator<G> + 'static,
        config: DFSConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let name = match config.mode {
            SearchMode::MaxN => format!("DFS(depth={})", config.max_depth),
            SearchMode::Paranoid => format!("Paranoid(depth={})", config.max_depth),
        };
        Ok(Self {
            game,
            evaluator: Box::new(evaluator),
            table: config.transposition_capacity.map(TranspositionTable::new),
            config,
            cancel: None,
            depth_sum: 0,
            decisions: 0,
            last_stats: None,
            name,
        })
    }

    /// Token checked before every node expansion; cancelling it makes the
    /// current decision return early.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &DFSConfig {
        &self.config
    }

    /// Statistics of the most recent decision.
    pub fn last_stats(&self) -> Option<&DFSStats<G::Move>> {
        self.last_stats.as_ref()
    }

    /// Mean completed depth over all decisions since the last reset.
    pub fn average_depth(&self) -> Option<f64> {
        (self.decisions > 0).then(|| self.depth_sum as f64 / self.decisions as f64)
    }

    pub fn transposition_table(&self) -> Option<&TranspositionTable<G::State>> {
        self.table.as_ref()
    }
}

impl<G: Game> Agent<G> for DFSAgent<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn decide(&mut self, state: &G::State) -> GameResult<G::Move> {
        let search = DFSSearch::new(&self.game, self.evaluator.as_ref(), &self.config)
            .map_err(|e| GameError::InvalidState(e.to_string()))?;
        let mut outcome = search
            .with_cancel(self.cancel.clone())
            .with_table(self.table.as_mut())
            .search(state)?;

        self.depth_sum += u64::from(outcome.stats.completed_depth);
        self.decisions += 1;
        outcome.stats.average_depth = self.depth_sum as f64 / self.decisions as f64;
        self.last_stats = Some(outcome.stats);
        Ok(outcome.best_move)
    }

    fn reset(&mut self) {
        self.last_stats = None;
        self.depth_sum = 0;
        self.decisions = 0;
        if let Some(table) = self.table.as_mut() {
            table.clear();
        }
    }
}
