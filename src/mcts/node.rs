//! MCTS node structures.
//!
//! Uses arena-based allocation with index references (NodeId); parents are
//! plain indices, so the tree owns every node exactly once.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{PlayerId, Utility};
use crate::game::Game;

/// Index into the MCTSTree node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct SearchNode<G: Game> {
    pub state: G::State,

    /// Parent node (NONE for root).
    pub parent: NodeId,

    /// Move that led here from the parent (None for root).
    pub incoming: Option<G::Move>,

    /// Player to act at this node.
    pub to_move: PlayerId,

    /// Depth in tree (root = 0).
    pub depth: u16,

    pub visits: u32,

    /// Sum of backed-up utilities, one accumulator per player.
    pub value: Utility,

    /// Utility of a terminal state.
    pub terminal: Option<Utility>,

    /// Playable moves without a child yet.
    pub untried: Vec<G::Move>,

    /// Children in expansion order.
    pub children: SmallVec<[NodeId; 8]>,

    /// Move to child lookup.
    pub child_index: FxHashMap<G::Move, NodeId>,
}

impl<G: Game> SearchNode<G> {
    pub fn new(
        state: G::State,
        parent: NodeId,
        incoming: Option<G::Move>,
        to_move: PlayerId,
        depth: u16,
        player_count: usize,
    ) -> Self {
        Self {
            state,
            parent,
            incoming,
            to_move,
            depth,
            visits: 0,
            value: Utility::with_value(player_count, 0.0),
            terminal: None,
            untried: Vec::new(),
            children: SmallVec::new(),
            child_index: FxHashMap::default(),
        }
    }

    /// Mean backed-up value for a player.
    #[must_use]
    pub fn mean_value(&self, player: PlayerId) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.value[player] / self.visits as f64
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    /// True when every playable move has a child.
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    #[must_use]
    pub fn child(&self, mv: &G::Move) -> Option<NodeId> {
        self.child_index.get(mv).copied()
    }
}
