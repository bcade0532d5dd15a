//! MCTS policies for selection and rollouts.
//!
//! Policies are trait-based to allow customization:
//! - `SelectionPolicy`: which child of a fully expanded node to descend into
//! - `RolloutPolicy`: which move to play during a simulation

use crate::core::{GameRng, Utility};
use crate::dfs::Evaluator;
use crate::error::GameResult;
use crate::game::{check_utility_len, playable_moves, Game};

use super::node::NodeId;
use super::tree::MCTSTree;

/// Policy for selecting which child node to explore.
pub trait SelectionPolicy<G: Game>: Send + Sync {
    /// Pick a child of `node`, or None when it has no children.
    fn select(&self, tree: &MCTSTree<G>, node: NodeId, exploration: f64) -> Option<NodeId>;
}

/// UCT selection for the player to act at the parent.
///
/// Formula: mean[p] + c * sqrt(ln(N_parent) / N_child), where `p` acts at
/// the parent. Ties go to the earliest expanded child.
#[derive(Clone, Copy, Debug, Default)]
pub struct UCT;

impl<G: Game> SelectionPolicy<G> for UCT {
    fn select(&self, tree: &MCTSTree<G>, node: NodeId, exploration: f64) -> Option<NodeId> {
        let parent = tree.get(node);
        let player = parent.to_move;
        let ln_parent = f64::from(parent.visits.max(1)).ln();

        let mut best: Option<(NodeId, f64)> = None;
        for &child_id in &parent.children {
            let child = tree.get(child_id);
            let score = if child.visits == 0 {
                f64::INFINITY
            } else {
                child.mean_value(player)
                    + exploration * (ln_parent / f64::from(child.visits)).sqrt()
            };
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((child_id, score));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Policy for choosing moves during a rollout.
///
/// Closures `Fn(&G, &G::State, &[G::Move], &mut GameRng) -> usize` implement
/// this; the returned index is clamped to the move list.
pub trait RolloutPolicy<G: Game>: Send + Sync {
    fn choose(&self, game: &G, state: &G::State, moves: &[G::Move], rng: &mut GameRng) -> usize;
}

/// Uniformly random legal moves.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomRollout;

impl<G: Game> RolloutPolicy<G> for RandomRollout {
    fn choose(&self, _game: &G, _state: &G::State, moves: &[G::Move], rng: &mut GameRng) -> usize {
        rng.gen_range_usize(0..moves.len())
    }
}

impl<G, F> RolloutPolicy<G> for F
where
    G: Game,
    F: Fn(&G, &G::State, &[G::Move], &mut GameRng) -> usize + Send + Sync,
{
    fn choose(&self, game: &G, state: &G::State, moves: &[G::Move], rng: &mut GameRng) -> usize {
        self(game, state, moves, rng)
    }
}

/// Truncated rollouts: after `moves` plies, score with `evaluator`.
pub struct Cutoff<'a, G: Game> {
    pub moves: u32,
    pub evaluator: &'a dyn Evaluator<G>,
}

/// Play from `state` to termination (or the cutoff) and return the utility.
pub fn simulate<G: Game>(
    game: &G,
    state: &G::State,
    policy: &dyn RolloutPolicy<G>,
    rng: &mut GameRng,
    cutoff: Option<&Cutoff<'_, G>>,
) -> GameResult<Utility> {
    let mut state = state.clone();
    let mut played = 0u32;
    loop {
        if game.is_terminal(&state) {
            return game.utility(&state);
        }
        if let Some(cutoff) = cutoff {
            if played >= cutoff.moves {
                let estimate = cutoff.evaluator.evaluate(game, &state);
                check_utility_len(game, &estimate)?;
                return Ok(estimate);
            }
        }

        let moves = playable_moves(game, &state)?;
        let index = policy.choose(game, &state, &moves, rng).min(moves.len() - 1);
        state = game.apply(&state, &moves[index])?;
        played += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PlayerId;
    use crate::dfs::ConstantEvaluator;
    use crate::games::{Nim, NimState, Take};
    use crate::mcts::node::SearchNode;

    fn nim_node(stones: u32, parent: NodeId, mv: Option<Take>) -> SearchNode<Nim> {
        let state = NimState {
            stones,
            to_move: PlayerId::new(0),
            last_mover: None,
        };
        SearchNode::new(state, parent, mv, PlayerId::new(0), 0, 2)
    }

    #[test]
    fn test_uct_prefers_unvisited_then_value() {
        let mut tree = MCTSTree::new(nim_node(5, NodeId::NONE, None), 2);
        let root = tree.root();
        let a = tree.alloc(nim_node(4, root, Some(Take(1))));
        let b = tree.alloc(nim_node(3, root, Some(Take(2))));
        tree.get_mut(root).children.extend([a, b]);
        tree.get_mut(root).visits = 10;

        tree.get_mut(a).visits = 5;
        tree.get_mut(a).value[PlayerId::new(0)] = 1.0;
        assert_eq!(UCT.select(&tree, root, 1.4), Some(b));

        tree.get_mut(b).visits = 5;
        tree.get_mut(b).value[PlayerId::new(0)] = 4.0;
        assert_eq!(UCT.select(&tree, root, 1.4), Some(b));

        // Equal statistics: earliest child wins.
        tree.get_mut(a).value[PlayerId::new(0)] = 4.0;
        assert_eq!(UCT.select(&tree, root, 1.4), Some(a));
    }

    #[test]
    fn test_uct_no_children() {
        let tree = MCTSTree::new(nim_node(5, NodeId::NONE, None), 2);
        assert_eq!(UCT.select(&tree, tree.root(), 1.0), None);
    }

    #[test]
    fn test_simulate_reaches_terminal() {
        let game = Nim::new(3, 3);
        let mut rng = GameRng::new(9);
        let utility = simulate(&game, &game.initial_state(20), &RandomRollout, &mut rng, None)
            .unwrap();
        assert_eq!(utility.total(), 1.0);
    }

    #[test]
    fn test_closure_rollout_and_cutoff() {
        let game = Nim::new(2, 3);
        let greedy = |_: &Nim, _: &NimState, moves: &[Take], _: &mut GameRng| moves.len() - 1;
        let mut rng = GameRng::new(0);

        // Always taking 3 from 6: P0 -> 3, P1 takes the last stones.
        let utility = simulate(&game, &game.initial_state(6), &greedy, &mut rng, None).unwrap();
        assert_eq!(utility.as_slice(), &[0.0, 1.0]);

        let evaluator = ConstantEvaluator(0.5);
        let cutoff = Cutoff {
            moves: 1,
            evaluator: &evaluator,
        };
        let utility =
            simulate(&game, &game.initial_state(6), &greedy, &mut rng, Some(&cutoff)).unwrap();
        assert_eq!(utility.as_slice(), &[0.5, 0.5]);
    }
}
