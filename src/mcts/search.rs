//! Core MCTS search algorithm.
//!
//! Each iteration selects down the tree with the selection policy, expands
//! one untried move, runs rollouts from the new node and adds the summed
//! utility vector to every node on the path up to and including the root.
//! Node statistics change only in that final backpropagation, so the budget
//! is checked between iterations.

use rayon::prelude::*;
use tracing::debug;

use crate::core::{Budget, BudgetClock, CancelToken, GameRng, StopReason, Utility};
use crate::dfs::Evaluator;
use crate::error::{ConfigError, GameError, GameResult};
use crate::game::{check_utility_len, playable_moves, Game};

use super::config::{ExpansionOrder, MCTSConfig};
use super::node::{NodeId, SearchNode};
use super::policy::{simulate, Cutoff, RandomRollout, RolloutPolicy, SelectionPolicy, UCT};
use super::stats::SearchStats;
use super::tree::MCTSTree;

/// Statistics of one root child after a search.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildStats<M> {
    pub mv: M,
    pub visits: u32,
    /// Mean reward for the player to act at the root.
    pub mean_reward: f64,
}

/// Main MCTS search context.
///
/// Owns the game descriptor, the configuration, the RNG and (between
/// decisions, when retention is enabled) the tree.
pub struct MCTSSearch<G: Game> {
    game: G,
    config: MCTSConfig,
    tree: Option<MCTSTree<G>>,
    rng: GameRng,
    selection: Box<dyn SelectionPolicy<G>>,
    rollout: Box<dyn RolloutPolicy<G>>,
    evaluator: Option<Box<dyn Evaluator<G>>>,
    cancel: Option<CancelToken>,
    stats: SearchStats,
}

impl<G: Game> MCTSSearch<G> {
    /// Create a search after validating `config`.
    pub fn new(game: G, config: MCTSConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = GameRng::new(config.seed);
        Ok(Self {
            game,
            config,
            tree: None,
            rng,
            selection: Box::new(UCT),
            rollout: Box::new(RandomRollout),
            evaluator: None,
            cancel: None,
            stats: SearchStats::default(),
        })
    }

    pub fn with_selection<S: SelectionPolicy<G> + 'static>(mut self, selection: S) -> Self {
        self.selection = Box::new(selection);
        self
    }

    pub fn with_rollout<R: RolloutPolicy<G> + 'static>(mut self, rollout: R) -> Self {
        self.rollout = Box::new(rollout);
        self
    }

    /// Evaluator for truncated rollouts (see `MCTSConfig::rollout_cutoff`).
    pub fn with_evaluator<E: Evaluator<G> + 'static>(mut self, evaluator: E) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn config(&self) -> &MCTSConfig {
        &self.config
    }

    /// Statistics of the most recent search.
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// Current tree, if one is held.
    pub fn tree(&self) -> Option<&MCTSTree<G>> {
        self.tree.as_ref()
    }

    /// Drop the tree and restart the RNG stream from the configured seed.
    pub fn reset(&mut self) {
        self.tree = None;
        self.rng = GameRng::new(self.config.seed);
        self.stats.reset();
    }

    /// Run one decision from `root` and return the most visited root child's
    /// move.
    pub fn search(&mut self, root: &G::State) -> GameResult<G::Move> {
        let moves = playable_moves(&self.game, root)?;
        self.stats.reset();

        if moves.len() == 1 {
            return Ok(moves[0].clone());
        }

        let clock = Budget::unlimited()
            .with_iterations(self.config.iteration_budget)
            .with_time(self.config.time_budget())
            .with_cancel(self.cancel.clone())
            .start();

        let mut tree = match self.tree.take() {
            Some(tree)
                if self.config.retain_tree_across_turns && tree.root_node().state == *root =>
            {
                tree
            }
            _ => {
                let node = self.new_node(root.clone(), NodeId::NONE, None, 0)?;
                MCTSTree::new(node, self.game.player_count())
            }
        };

        let outcome = self.run(&mut tree, &clock);
        self.stats.time_us = clock.elapsed().as_micros() as u64;
        let best = Self::best_child(&tree);
        let root_player = tree.root_node().to_move;
        self.stats.root_visits = tree.root_node().visits;
        if let Some(id) = best {
            let child = tree.get(id);
            self.stats.best_visits = child.visits;
            self.stats.best_mean_reward = child.mean_value(root_player);
        }
        let chosen = best
            .and_then(|id| tree.get(id).incoming.clone())
            .unwrap_or_else(|| moves[0].clone());
        self.tree = Some(tree);
        self.stats.stop_reason = outcome?;

        if self.stats.budget_exhausted() {
            debug!(
                reason = ?self.stats.stop_reason,
                iterations = self.stats.iterations,
                "mcts search budget exhausted"
            );
        }
        debug!(
            best = ?chosen,
            iterations = self.stats.iterations,
            simulations = self.stats.simulations,
            visits = self.stats.best_visits,
            mean_reward = self.stats.best_mean_reward,
            elapsed_us = self.stats.time_us,
            "mcts search finished"
        );

        Ok(chosen)
    }

    /// Follow a committed move. With retention the child becomes the new
    /// root when it exists and holds `next`; otherwise the tree is dropped.
    pub fn advance(&mut self, mv: &G::Move, next: &G::State) {
        if !self.config.retain_tree_across_turns {
            self.tree = None;
            return;
        }
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        match tree.root_node().child(mv) {
            Some(child) if tree.get(child).state == *next => {
                tree.reroot(child);
                debug!(nodes = tree.len(), visits = tree.root_node().visits, "mcts tree re-rooted");
            }
            _ => self.tree = None,
        }
    }

    /// Per-child statistics at the root of the current tree, in expansion
    /// order.
    pub fn root_statistics(&self) -> Vec<ChildStats<G::Move>> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let root = tree.root_node();
        root.children
            .iter()
            .filter_map(|&id| {
                let child = tree.get(id);
                child.incoming.clone().map(|mv| ChildStats {
                    mv,
                    visits: child.visits,
                    mean_reward: child.mean_value(root.to_move),
                })
            })
            .collect()
    }

    fn run(&mut self, tree: &mut MCTSTree<G>, clock: &BudgetClock) -> GameResult<StopReason> {
        loop {
            if let Some(reason) = clock.check(self.stats.iterations) {
                return Ok(reason);
            }
            if tree.len() >= self.config.max_nodes {
                return Ok(StopReason::NodeLimit);
            }
            self.iteration(tree)?;
            self.stats.iterations += 1;
        }
    }

    fn iteration(&mut self, tree: &mut MCTSTree<G>) -> GameResult<()> {
        let mut current = tree.root();
        loop {
            let node = tree.get(current);
            if node.is_terminal() || !node.untried.is_empty() {
                break;
            }
            current = self
                .selection
                .select(tree, current, self.config.exploration_constant)
                .ok_or_else(|| {
                    GameError::InvalidState(format!(
                        "non-terminal node {current} has no moves and no children"
                    ))
                })?;
        }

        let (total, count) = match tree.get(current).terminal.clone() {
            Some(utility) => (utility, 1),
            None => {
                current = self.expand(tree, current)?;
                match tree.get(current).terminal.clone() {
                    Some(utility) => (utility, 1),
                    None => {
                        let state = tree.get(current).state.clone();
                        self.rollouts(&state)?
                    }
                }
            }
        };

        Self::backpropagate(tree, current, &total, count);
        Ok(())
    }

    fn expand(&mut self, tree: &mut MCTSTree<G>, parent: NodeId) -> GameResult<NodeId> {
        let untried = tree.get(parent).untried.len();
        let index = match self.config.expansion {
            ExpansionOrder::InOrder => 0,
            ExpansionOrder::Random => self.rng.gen_range_usize(0..untried),
        };
        let mv = tree.get_mut(parent).untried.remove(index);

        let (state, depth) = {
            let node = tree.get(parent);
            (self.game.apply(&node.state, &mv)?, node.depth + 1)
        };
        let node = self.new_node(state, parent, Some(mv.clone()), depth)?;
        let id = tree.alloc(node);

        let parent_node = tree.get_mut(parent);
        parent_node.children.push(id);
        parent_node.child_index.insert(mv, id);

        self.stats.nodes_expanded += 1;
        self.stats.max_depth = self.stats.max_depth.max(depth);
        Ok(id)
    }

    fn new_node(
        &self,
        state: G::State,
        parent: NodeId,
        incoming: Option<G::Move>,
        depth: u16,
    ) -> GameResult<SearchNode<G>> {
        let to_move = self.game.current_player(&state);
        let mut node = SearchNode::new(
            state,
            parent,
            incoming,
            to_move,
            depth,
            self.game.player_count(),
        );
        if self.game.is_terminal(&node.state) {
            let utility = self.game.utility(&node.state)?;
            check_utility_len(&self.game, &utility)?;
            node.terminal = Some(utility);
        } else {
            node.untried = playable_moves(&self.game, &node.state)?;
        }
        Ok(node)
    }

    /// Run `rollouts_per_leaf` simulations from `state` and return their
    /// summed utility with the rollout count.
    fn rollouts(&mut self, state: &G::State) -> GameResult<(Utility, u32)> {
        let count = self.config.rollouts_per_leaf;
        let cutoff = match (self.config.rollout_cutoff, self.evaluator.as_deref()) {
            (Some(moves), Some(evaluator)) => Some(Cutoff { moves, evaluator }),
            _ => None,
        };
        let game = &self.game;
        let policy = self.rollout.as_ref();

        let results = if count == 1 {
            vec![simulate(game, state, policy, &mut self.rng, cutoff.as_ref())?]
        } else {
            let streams: Vec<GameRng> = (0..count).map(|_| self.rng.fork()).collect();
            streams
                .into_par_iter()
                .map(|mut rng| simulate(game, state, policy, &mut rng, cutoff.as_ref()))
                .collect::<GameResult<Vec<_>>>()?
        };

        let mut total = Utility::with_value(game.player_count(), 0.0);
        for utility in &results {
            check_utility_len(game, utility)?;
            total.accumulate(utility);
        }
        self.stats.simulations += u64::from(count);
        Ok((total, count))
    }

    fn backpropagate(tree: &mut MCTSTree<G>, leaf: NodeId, total: &Utility, count: u32) {
        let mut id = leaf;
        while !id.is_none() {
            let node = tree.get_mut(id);
            node.visits += count;
            node.value.accumulate(total);
            id = node.parent;
        }
    }

    /// Robust child: most visits, ties to the earliest expanded.
    fn best_child(tree: &MCTSTree<G>) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for &id in &tree.root_node().children {
            let visits = tree.get(id).visits;
            if best.map_or(true, |(_, v)| visits > v) {
                best = Some((id, visits));
            }
        }
        best.map(|(id, _)| id)
    }
}
