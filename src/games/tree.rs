//! Synthetic game tree for validating agents against known-optimal play.
//!
//! Every vertex may carry a score vector (a heuristic estimate at inner
//! vertices, the utility at leaves). Players act in seat order starting with
//! player 0, one ply per level.
//!
//! ```text
//!                       (1, 1, 1)
//!                      /         \
//!              (1, 4, 4)         (0, 1, 2)
//!              /      \          /      \
//!       (2, 3, 0) (1, 1, 0) (4, 0, 4) (1, 1, 1)
//! ```
//!
//! is built as
//!
//! ```
//! use rust_boardgames::games::{TreeGame, TreeSpec};
//!
//! let spec = TreeSpec::scored(&[1.0, 1.0, 1.0], vec![
//!     TreeSpec::scored(&[1.0, 4.0, 4.0], vec![
//!         TreeSpec::leaf(&[2.0, 3.0, 0.0]),
//!         TreeSpec::leaf(&[1.0, 1.0, 0.0]),
//!     ]),
//!     TreeSpec::scored(&[0.0, 1.0, 2.0], vec![
//!         TreeSpec::leaf(&[4.0, 0.0, 4.0]),
//!         TreeSpec::leaf(&[1.0, 1.0, 1.0]),
//!     ]),
//! ]);
//! let game = TreeGame::new(3, spec).unwrap();
//! assert_eq!(game.depth(), 2);
//! ```

use std::sync::Arc;

use crate::core::{GameRng, PlayerId, Utility};
use crate::error::{GameError, GameResult};
use crate::game::{check_legal, Game};
use crate::nn::{EncodedState, StateEncoder};

/// Nested description of a tree, converted into a [`TreeGame`].
#[derive(Clone, Debug, PartialEq)]
pub enum TreeSpec {
    Leaf(Vec<f64>),
    Node {
        scores: Option<Vec<f64>>,
        children: Vec<TreeSpec>,
    },
}

impl TreeSpec {
    pub fn leaf(scores: &[f64]) -> Self {
        TreeSpec::Leaf(scores.to_vec())
    }

    /// Inner vertex without a heuristic score.
    pub fn branch(children: Vec<TreeSpec>) -> Self {
        TreeSpec::Node {
            scores: None,
            children,
        }
    }

    /// Inner vertex with a heuristic score vector.
    pub fn scored(scores: &[f64], children: Vec<TreeSpec>) -> Self {
        TreeSpec::Node {
            scores: Some(scores.to_vec()),
            children,
        }
    }
}

#[derive(Clone, Debug)]
struct Vertex {
    scores: Option<Utility>,
    children: Vec<u32>,
}

/// Position in a [`TreeGame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeState {
    pub vertex: u32,
    pub depth: u16,
}

/// Edge index into the current vertex's children (0-based).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Branch(pub u16);

/// Immutable game tree shared cheaply between agents.
#[derive(Clone, Debug)]
pub struct TreeGame {
    players: usize,
    vertices: Arc<Vec<Vertex>>,
}

impl TreeGame {
    /// Build a game from a `TreeSpec`. Every score vector must have one entry per
    /// player and every leaf must carry scores.
    pub fn new(players: usize, spec: TreeSpec) -> GameResult<Self> {
        if players == 0 {
            return Err(GameError::InvalidState("tree game needs at least one player".into()));
        }
        let mut vertices = Vec::new();
        Self::flatten(players, spec, &mut vertices)?;
        Ok(Self {
            players,
            vertices: Arc::new(vertices),
        })
    }

    fn flatten(players: usize, spec: TreeSpec, out: &mut Vec<Vertex>) -> GameResult<u32> {
        let check = |scores: Vec<f64>| -> GameResult<Utility> {
            if scores.len() == players {
                Ok(Utility::from_vec(scores))
            } else {
                Err(GameError::InvalidState(format!(
                    "score vector {scores:?} does not have {players} entries"
                )))
            }
        };

        let id = out.len() as u32;
        match spec {
            TreeSpec::Leaf(scores) => {
                out.push(Vertex {
                    scores: Some(check(scores)?),
                    children: Vec::new(),
                });
            }
            TreeSpec::Node { scores, children } => {
                if children.is_empty() {
                    return Err(GameError::InvalidState(
                        "inner vertex without children; use TreeSpec::leaf".into(),
                    ));
                }
                out.push(Vertex {
                    scores: scores.map(check).transpose()?,
                    children: Vec::with_capacity(children.len()),
                });
                for child in children {
                    let child_id = Self::flatten(players, child, out)?;
                    out[id as usize].children.push(child_id);
                }
            }
        }
        Ok(id)
    }

    /// Complete tree of the given depth and branching factor with random
    /// integer leaf scores in `0..10`.
    pub fn random(players: usize, depth: u16, branching: u16, seed: u64) -> GameResult<Self> {
        fn build(players: usize, depth: u16, branching: u16, rng: &mut GameRng) -> TreeSpec {
            if depth == 0 {
                let scores: Vec<f64> = (0..players)
                    .map(|_| rng.gen_range_usize(0..10) as f64)
                    .collect();
                TreeSpec::Leaf(scores)
            } else {
                TreeSpec::branch(
                    (0..branching)
                        .map(|_| build(players, depth - 1, branching, rng))
                        .collect(),
                )
            }
        }

        let mut rng = GameRng::new(seed);
        Self::new(players, build(players, depth, branching, &mut rng))
    }

    #[must_use]
    pub fn initial_state(&self) -> TreeState {
        TreeState { vertex: 0, depth: 0 }
    }

    /// Number of vertices.
    #[must_use]
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    /// Largest number of children of any vertex.
    #[must_use]
    pub fn max_branching(&self) -> usize {
        self.vertices.iter().map(|v| v.children.len()).max().unwrap_or(0)
    }

    /// Length of the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> u16 {
        let mut max = 0;
        let mut stack = vec![(0u32, 0u16)];
        while let Some((v, d)) = stack.pop() {
            max = max.max(d);
            for &c in &self.vertices[v as usize].children {
                stack.push((c, d + 1));
            }
        }
        max
    }

    /// Score vector stored at the state's vertex, or zeros when absent.
    /// Serves as the heuristic evaluator for depth-limited search.
    #[must_use]
    pub fn heuristic(&self, state: &TreeState) -> Utility {
        self.vertices
            .get(state.vertex as usize)
            .and_then(|v| v.scores.clone())
            .unwrap_or_else(|| Utility::with_value(self.players, 0.0))
    }

    /// Largest single score anywhere in the tree.
    #[must_use]
    pub fn max_score(&self) -> f64 {
        self.scores().flat_map(|s| s.as_slice().iter().copied()).fold(f64::MIN, f64::max)
    }

    /// Smallest single score anywhere in the tree.
    #[must_use]
    pub fn min_score(&self) -> f64 {
        self.scores().flat_map(|s| s.as_slice().iter().copied()).fold(f64::MAX, f64::min)
    }

    /// Largest sum of a score vector anywhere in the tree.
    #[must_use]
    pub fn max_score_sum(&self) -> f64 {
        self.scores().map(Utility::total).fold(f64::MIN, f64::max)
    }

    fn scores(&self) -> impl Iterator<Item = &Utility> {
        self.vertices.iter().filter_map(|v| v.scores.as_ref())
    }

    fn vertex(&self, state: &TreeState) -> GameResult<&Vertex> {
        self.vertices.get(state.vertex as usize).ok_or_else(|| {
            GameError::InvalidState(format!("vertex {} not in tree", state.vertex))
        })
    }
}

impl Game for TreeGame {
    type State = TreeState;
    type Move = Branch;

    fn player_count(&self) -> usize {
        self.players
    }

    fn legal_moves(&self, state: &TreeState) -> GameResult<Vec<Branch>> {
        let vertex = self.vertex(state)?;
        if vertex.children.is_empty() {
            return Err(GameError::InvalidState(format!(
                "legal moves requested at leaf {}",
                state.vertex
            )));
        }
        Ok((0..vertex.children.len() as u16).map(Branch).collect())
    }

    fn apply(&self, state: &TreeState, mv: &Branch) -> GameResult<TreeState> {
        check_legal(self, state, mv)?;
        let vertex = self.vertex(state)?;
        Ok(TreeState {
            vertex: vertex.children[mv.0 as usize],
            depth: state.depth + 1,
        })
    }

    fn is_terminal(&self, state: &TreeState) -> bool {
        self.vertex(state).map(|v| v.children.is_empty()).unwrap_or(true)
    }

    fn utility(&self, state: &TreeState) -> GameResult<Utility> {
        let vertex = self.vertex(state)?;
        if !vertex.children.is_empty() {
            return Err(GameError::NotTerminal);
        }
        vertex
            .scores
            .clone()
            .ok_or_else(|| GameError::InvalidState(format!("leaf {} has no scores", state.vertex)))
    }

    fn current_player(&self, state: &TreeState) -> PlayerId {
        PlayerId::new((state.depth as usize % self.players) as u8)
    }
}

/// One-hot vertex encoding plus a one-hot perspective seat.
#[derive(Clone, Debug)]
pub struct TreeEncoder {
    vertices: usize,
    players: usize,
    actions: usize,
}

impl TreeEncoder {
    pub fn new(game: &TreeGame) -> Self {
        Self {
            vertices: game.size(),
            players: game.player_count(),
            actions: game.max_branching().max(1),
        }
    }
}

impl StateEncoder<TreeGame> for TreeEncoder {
    fn encode(&self, _game: &TreeGame, state: &TreeState, perspective: PlayerId) -> EncodedState {
        let mut features = vec![0.0; self.feature_count()];
        if (state.vertex as usize) < self.vertices {
            features[state.vertex as usize] = 1.0;
        }
        features[self.vertices + perspective.index() % self.players] = 1.0;
        EncodedState::flat(features)
    }

    fn feature_count(&self) -> usize {
        self.vertices + self.players
    }

    fn action_count(&self) -> usize {
        self.actions
    }

    fn action_index(&self, _game: &TreeGame, _state: &TreeState, mv: &Branch) -> GameResult<usize> {
        let index = mv.0 as usize;
        if index < self.actions {
            Ok(index)
        } else {
            Err(GameError::IllegalMove(format!("{mv:?} outside action space")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> TreeGame {
        TreeGame::new(
            2,
            TreeSpec::scored(
                &[0.5, 0.5],
                vec![
                    TreeSpec::branch(vec![TreeSpec::leaf(&[1.0, 0.0]), TreeSpec::leaf(&[0.0, 1.0])]),
                    TreeSpec::leaf(&[0.3, 0.7]),
                ],
            ),
        )
        .unwrap()
    }

    #[test]
    fn test_structure() {
        let game = two_level();
        assert_eq!(game.size(), 5);
        assert_eq!(game.depth(), 2);
        assert_eq!(game.max_branching(), 2);
        assert_eq!(game.max_score(), 1.0);
        assert_eq!(game.min_score(), 0.0);
        assert_eq!(game.max_score_sum(), 1.0);
    }

    #[test]
    fn test_turns_alternate() {
        let game = two_level();
        let root = game.initial_state();
        assert_eq!(game.current_player(&root), PlayerId::new(0));

        let child = game.apply(&root, &Branch(0)).unwrap();
        assert_eq!(game.current_player(&child), PlayerId::new(1));
        assert!(!game.is_terminal(&child));

        let leaf = game.apply(&child, &Branch(1)).unwrap();
        assert!(game.is_terminal(&leaf));
        assert_eq!(game.utility(&leaf).unwrap().as_slice(), &[0.0, 1.0]);
    }

    #[test]
    fn test_contract_errors() {
        let game = two_level();
        let root = game.initial_state();
        assert_eq!(game.utility(&root), Err(GameError::NotTerminal));
        assert!(matches!(game.apply(&root, &Branch(2)), Err(GameError::IllegalMove(_))));

        let leaf = game.apply(&root, &Branch(1)).unwrap();
        assert!(matches!(game.legal_moves(&leaf), Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_heuristic_defaults_to_zero() {
        let game = two_level();
        let root = game.initial_state();
        assert_eq!(game.heuristic(&root).as_slice(), &[0.5, 0.5]);

        let unscored = game.apply(&root, &Branch(0)).unwrap();
        assert_eq!(game.heuristic(&unscored).as_slice(), &[0.0, 0.0]);
    }

    #[test]
    fn test_rejects_wrong_score_length() {
        let result = TreeGame::new(3, TreeSpec::branch(vec![TreeSpec::leaf(&[1.0, 0.0])]));
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_random_tree_shape() {
        let game = TreeGame::random(3, 3, 2, 11).unwrap();
        assert_eq!(game.size(), 1 + 2 + 4 + 8);
        assert_eq!(game.depth(), 3);
        assert!(game.min_score() >= 0.0);
        assert!(game.max_score() < 10.0);
    }

    #[test]
    fn test_encoder() {
        let game = two_level();
        let encoder = TreeEncoder::new(&game);
        assert_eq!(encoder.feature_count(), 7);
        assert_eq!(encoder.action_count(), 2);

        let encoded = encoder.encode(&game, &game.initial_state(), PlayerId::new(1));
        assert_eq!(encoded.tensor, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(
            encoder.action_index(&game, &game.initial_state(), &Branch(1)),
            Ok(1)
        );
    }
}
