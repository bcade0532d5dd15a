//! Depth-bounded N-player search with an explicit stack.
//!
//! In max-n mode the player to act at every node picks the child maximizing
//! its own coordinate of the reward vector. In paranoid mode the root player
//! maximizes its coordinate and every other player minimizes it. Ties keep
//! the first child in search order. The search never recurses, so deep limits
//! cannot exhaust the call stack and the budget can be polled before every
//! node expansion.
//!
//! ## Pruning
//!
//! With [`PruningBounds`] configured, max-n applies two cut-offs, both of
//! which leave the root decision unchanged:
//!
//! - *immediate*: a node whose player already has `max_value` stops;
//! - *shallow*: a node whose player has `v` stops once `v >= max_sum - b`,
//!   where `b` is the best value the parent's (different) player holds.
//!   The parent player can then get at most `b` from this node and only
//!   switches on a strict improvement.
//!
//! Paranoid mode uses alpha-beta windows on the root player's coordinate.
//!
//! ## Move ordering
//!
//! With a [`TranspositionTable`], children are searched best-first by the
//! value last backed up for them. Unknown children follow in enumeration
//! order.

use std::cmp::Ordering;
use std::time::Duration;

use tracing::debug;

use crate::core::{Budget, BudgetClock, CancelToken, PlayerId, StopReason, Utility};
use crate::error::{ConfigError, GameError, GameResult};
use crate::game::{check_utility_len, playable_moves, Game};

use super::config::{DFSConfig, PruningBounds, SearchMode};
use super::evaluator::Evaluator;
use super::transposition::TranspositionTable;

/// Counters for one decision.
#[derive(Clone, Debug, PartialEq)]
pub struct DFSStats<M> {
    /// Child positions generated, over all iterations.
    pub nodes: u64,
    /// Nodes whose remaining moves were skipped by pruning.
    pub cutoffs: u64,
    /// Child positions found in the transposition table while ordering.
    pub table_hits: u64,
    /// Deepest fully searched depth (0 if none completed).
    pub completed_depth: u32,
    /// Mean completed depth over the decisions of one agent. A lone search
    /// reports its own `completed_depth`.
    pub average_depth: f64,
    /// Expected line of play behind the chosen move, starting with it.
    /// Empty when no root child was evaluated.
    pub principal_variation: Vec<M>,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

impl<M> DFSStats<M> {
    /// True when the time budget or a cancellation cut the search short.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.stop_reason.is_exhaustion()
    }
}

impl<M> Default for DFSStats<M> {
    fn default() -> Self {
        Self {
            nodes: 0,
            cutoffs: 0,
            table_hits: 0,
            completed_depth: 0,
            average_depth: 0.0,
            principal_variation: Vec::new(),
            stop_reason: StopReason::Completed,
            elapsed: Duration::ZERO,
        }
    }
}

/// Result of a search: the chosen move and its backed-up value.
#[derive(Clone, Debug)]
pub struct DFSOutcome<M> {
    pub best_move: M,
    /// Backed-up reward vector of `best_move`, if any root child was fully
    /// evaluated.
    pub value: Option<Utility>,
    pub stats: DFSStats<M>,
}

struct Frame<G: Game> {
    state: G::State,
    player: PlayerId,
    depth_left: u32,
    /// Moves in search order, with the child state when ordering already
    /// produced it.
    moves: Vec<(G::Move, Option<G::State>)>,
    next: usize,
    best: Option<Utility>,
    /// Best line found so far, starting with this node's move.
    line: Vec<G::Move>,
    alpha: f64,
    beta: f64,
}

enum Iteration<M> {
    Complete {
        line: Vec<M>,
        value: Utility,
        hit_depth_limit: bool,
    },
    Interrupted {
        reason: StopReason,
        /// Best root line among the children fully evaluated before the
        /// interrupt.
        partial: Option<(Vec<M>, Utility)>,
    },
}

/// One depth-first search over a game.
pub struct DFSSearch<'a, G: Game> {
    game: &'a G,
    evaluator: &'a dyn Evaluator<G>,
    config: &'a DFSConfig,
    cancel: Option<CancelToken>,
    table: Option<&'a mut TranspositionTable<G::State>>,
    root_player: PlayerId,
    stats: DFSStats<G::Move>,
}

impl<'a, G: Game> DFSSearch<'a, G> {
    /// Create a search after validating `config`.
    pub fn new(
        game: &'a G,
        evaluator: &'a dyn Evaluator<G>,
        config: &'a DFSConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            game,
            evaluator,
            config,
            cancel: None,
            table: None,
            root_player: PlayerId::new(0),
            stats: DFSStats::default(),
        })
    }

    pub fn with_cancel(mut self, token: Option<CancelToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Order moves by, and record backed-up values into, `table`.
    pub fn with_table(mut self, table: Option<&'a mut TranspositionTable<G::State>>) -> Self {
        self.table = table;
        self
    }

    /// Choose a move for the player to act in `root`.
    ///
    /// An interrupted search answers with the deepest completed iteration,
    /// else the best fully evaluated root child of the interrupted
    /// iteration, else the first playable move.
    pub fn search(mut self, root: &G::State) -> GameResult<DFSOutcome<G::Move>> {
        let moves = playable_moves(self.game, root)?;
        self.root_player = self.game.current_player(root);
        let clock = Budget::unlimited()
            .with_time(self.config.time_budget())
            .with_cancel(self.cancel.clone())
            .start();

        let max_depth = self.config.max_depth;
        let first_depth = if self.config.iterative_deepening { 1 } else { max_depth };

        let mut completed: Option<(Vec<G::Move>, Utility)> = None;
        let mut partial = None;
        for depth in first_depth..=max_depth {
            match self.iteration(root, depth, &clock)? {
                Iteration::Complete {
                    line,
                    value,
                    hit_depth_limit,
                } => {
                    debug!(depth, value = ?value.as_slice(), pv = ?line, "dfs iteration complete");
                    completed = Some((line, value));
                    self.stats.completed_depth = depth;
                    if !hit_depth_limit {
                        // The whole game tree fits in this depth.
                        break;
                    }
                }
                Iteration::Interrupted {
                    reason,
                    partial: found,
                } => {
                    self.stats.stop_reason = reason;
                    partial = found;
                    break;
                }
            }
        }
        self.stats.elapsed = clock.elapsed();
        self.stats.average_depth = f64::from(self.stats.completed_depth);

        let (line, value) = match completed.or(partial) {
            Some((line, value)) => (line, Some(value)),
            None => (Vec::new(), None),
        };
        let best_move = line.first().cloned().unwrap_or_else(|| moves[0].clone());
        self.stats.principal_variation = line;

        if self.stats.budget_exhausted() {
            debug!(
                reason = ?self.stats.stop_reason,
                completed_depth = self.stats.completed_depth,
                "dfs search budget exhausted"
            );
        }
        debug!(
            nodes = self.stats.nodes,
            cutoffs = self.stats.cutoffs,
            table_hits = self.stats.table_hits,
            depth = self.stats.completed_depth,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            best = ?best_move,
            "dfs search finished"
        );

        Ok(DFSOutcome {
            best_move,
            value,
            stats: self.stats,
        })
    }

    fn frame(&mut self, state: G::State, depth_left: u32, window: (f64, f64)) -> GameResult<Frame<G>> {
        let player = self.game.current_player(&state);
        let moves = self.order(&state, player, playable_moves(self.game, &state)?)?;
        Ok(Frame {
            player,
            state,
            depth_left,
            moves,
            next: 0,
            best: None,
            line: Vec::new(),
            alpha: window.0,
            beta: window.1,
        })
    }

    fn order(
        &mut self,
        state: &G::State,
        player: PlayerId,
        moves: Vec<G::Move>,
    ) -> GameResult<Vec<(G::Move, Option<G::State>)>> {
        let game = self.game;
        let Some(table) = self.table.as_deref_mut() else {
            return Ok(moves.into_iter().map(|mv| (mv, None)).collect());
        };
        let (key_player, descending) = match self.config.mode {
            SearchMode::MaxN => (player, true),
            SearchMode::Paranoid => (self.root_player, player == self.root_player),
        };

        let mut keyed = Vec::with_capacity(moves.len());
        for mv in moves {
            let child = game.apply(state, &mv)?;
            let key = table.score(&child, key_player);
            if key.is_some() {
                self.stats.table_hits += 1;
            }
            keyed.push((key, mv, child));
        }
        keyed.sort_by(|a, b| match (a.0, b.0) {
            (Some(x), Some(y)) if descending => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(keyed.into_iter().map(|(_, mv, child)| (mv, Some(child))).collect())
    }

    /// Alpha-beta window handed to a child of `parent`.
    fn window(&self, parent: &Frame<G>) -> (f64, f64) {
        let (mut alpha, mut beta) = (parent.alpha, parent.beta);
        if let Some(best) = &parent.best {
            let v = best[self.root_player];
            if parent.player == self.root_player {
                alpha = alpha.max(v);
            } else {
                beta = beta.min(v);
            }
        }
        (alpha, beta)
    }

    fn iteration(
        &mut self,
        root: &G::State,
        depth: u32,
        clock: &BudgetClock,
    ) -> GameResult<Iteration<G::Move>> {
        let root_frame = self.frame(root.clone(), depth, (f64::NEG_INFINITY, f64::INFINITY))?;
        let mut stack = vec![root_frame];
        let mut hit_depth_limit = false;

        loop {
            if let Some(reason) = clock.interrupted() {
                let partial = stack
                    .first()
                    .and_then(|root| root.best.clone().map(|v| (root.line.clone(), v)));
                return Ok(Iteration::Interrupted { reason, partial });
            }

            let Some(top) = stack.last_mut() else { break };

            if top.next < top.moves.len() {
                let index = top.next;
                top.next += 1;
                let child = match top.moves[index].1.take() {
                    Some(child) => child,
                    None => self.game.apply(&top.state, &top.moves[index].0)?,
                };
                let depth_left = top.depth_left - 1;
                self.stats.nodes += 1;

                if self.game.is_terminal(&child) {
                    let value = self.game.utility(&child)?;
                    check_utility_len(self.game, &value)?;
                    self.integrate(&mut stack, value, index, Vec::new());
                } else if depth_left == 0 {
                    hit_depth_limit = true;
                    let value = self.evaluator.evaluate(self.game, &child);
                    check_utility_len(self.game, &value)?;
                    self.integrate(&mut stack, value, index, Vec::new());
                } else {
                    let window = self.window(top);
                    let frame = self.frame(child, depth_left, window)?;
                    stack.push(frame);
                }
                continue;
            }

            let Some(done) = stack.pop() else { break };
            let value = done.best.ok_or_else(|| {
                GameError::InvalidState(format!("no move evaluated at {:?}", done.state))
            })?;
            if let Some(table) = self.table.as_deref_mut() {
                table.insert(done.state.clone(), value.clone());
            }
            match stack.last() {
                Some(parent) => {
                    let index = parent.next - 1;
                    self.integrate(&mut stack, value, index, done.line);
                }
                None => {
                    return Ok(Iteration::Complete {
                        line: done.line,
                        value,
                        hit_depth_limit,
                    });
                }
            }
        }

        Err(GameError::InvalidState("search stack emptied without a result".into()))
    }

    /// True when `player`, choosing at a node, switches from `best` to
    /// `candidate`.
    fn prefers(&self, player: PlayerId, candidate: &Utility, best: &Utility) -> bool {
        match self.config.mode {
            SearchMode::MaxN => candidate[player] > best[player],
            SearchMode::Paranoid => {
                let root = self.root_player;
                if player == root {
                    candidate[root] > best[root]
                } else {
                    candidate[root] < best[root]
                }
            }
        }
    }

    /// Fold a child's value and line into the frame on top of the stack and
    /// apply pruning.
    fn integrate(&mut self, stack: &mut [Frame<G>], value: Utility, index: usize, line: Vec<G::Move>) {
        let Some((node, ancestors)) = stack.split_last_mut() else {
            return;
        };

        let improved = match &node.best {
            None => true,
            Some(best) => self.prefers(node.player, &value, best),
        };
        if improved {
            node.best = Some(value);
            node.line = std::iter::once(node.moves[index].0.clone()).chain(line).collect();
        }

        let Some(best) = node.best.as_ref() else {
            return;
        };
        if node.next >= node.moves.len() {
            return;
        }
        let cut = match self.config.mode {
            SearchMode::MaxN => self
                .config
                .pruning
                .is_some_and(|bounds| Self::should_cut(bounds, node.player, best, ancestors.last())),
            SearchMode::Paranoid if self.config.alpha_beta => {
                let v = best[self.root_player];
                if node.player == self.root_player {
                    v >= node.beta
                } else {
                    v <= node.alpha
                }
            }
            SearchMode::Paranoid => false,
        };
        if cut {
            node.next = node.moves.len();
            self.stats.cutoffs += 1;
        }
    }

    fn should_cut(
        bounds: PruningBounds,
        player: PlayerId,
        best: &Utility,
        parent: Option<&Frame<G>>,
    ) -> bool {
        let own = best[player];
        if own >= bounds.max_value {
            return true;
        }
        match parent {
            Some(parent) if parent.player != player => parent
                .best
                .as_ref()
                .is_some_and(|b| own >= bounds.max_sum - b[parent.player]),
            _ => false,
        }
    }
}
