//! Arena-based MCTS tree.
//!
//! Uses a flat `Vec<SearchNode>` with index-based references. Re-rooting
//! compacts the arena so discarded siblings release their memory.

use std::collections::VecDeque;

use super::node::{NodeId, SearchNode};
use crate::game::Game;

/// Arena-based MCTS tree.
#[derive(Clone, Debug)]
pub struct MCTSTree<G: Game> {
    nodes: Vec<SearchNode<G>>,
    root: NodeId,
    player_count: usize,
}

impl<G: Game> MCTSTree<G> {
    /// Create a tree holding only `root`.
    pub fn new(root: SearchNode<G>, player_count: usize) -> Self {
        let mut nodes = Vec::with_capacity(1024);
        nodes.push(root);
        Self {
            nodes,
            root: NodeId::new(0),
            player_count,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode<G> {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<G> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node, returning its ID.
    pub fn alloc(&mut self, node: SearchNode<G>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    #[must_use]
    pub fn root_node(&self) -> &SearchNode<G> {
        self.get(self.root)
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SearchNode<G>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }

    /// Clear the tree and start over from `root`.
    pub fn reset(&mut self, root: SearchNode<G>) {
        self.nodes.clear();
        self.nodes.push(root);
        self.root = NodeId::new(0);
    }

    /// Make `new_root` the root, keeping only its subtree.
    ///
    /// Surviving nodes are renumbered breadth-first starting at 0; their
    /// statistics are preserved and depths are shifted so the new root has
    /// depth 0.
    pub fn reroot(&mut self, new_root: NodeId) {
        let base_depth = self.get(new_root).depth;

        let mut order = Vec::new();
        let mut remap = vec![NodeId::NONE; self.nodes.len()];
        let mut queue = VecDeque::from([new_root]);
        while let Some(id) = queue.pop_front() {
            remap[id.index()] = NodeId::new(order.len() as u32);
            order.push(id);
            queue.extend(self.get(id).children.iter().copied());
        }

        let mut old: Vec<Option<SearchNode<G>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for id in order {
            let Some(mut node) = old[id.index()].take() else {
                continue;
            };
            node.parent = if id == new_root {
                NodeId::NONE
            } else {
                remap[node.parent.index()]
            };
            if id == new_root {
                node.incoming = None;
            }
            node.depth -= base_depth;
            for child in node.children.iter_mut() {
                *child = remap[child.index()];
            }
            for child in node.child_index.values_mut() {
                *child = remap[child.index()];
            }
            nodes.push(node);
        }

        self.nodes = nodes;
        self.root = NodeId::new(0);
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let max_depth = self.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let terminal_count = self.nodes.iter().filter(|n| n.is_terminal()).count();
        let expanded_edges: usize = self.nodes.iter().map(|n| n.children.len()).sum();
        let untried_edges: usize = self.nodes.iter().map(|n| n.untried.len()).sum();

        TreeStats {
            node_count: self.nodes.len(),
            max_depth,
            terminal_count,
            total_edges: expanded_edges + untried_edges,
            expanded_edges,
        }
    }
}

/// Shape of an MCTS tree.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    pub node_count: usize,
    pub max_depth: u16,
    pub terminal_count: usize,
    /// Expanded plus untried moves over all nodes.
    pub total_edges: usize,
    /// Moves with a child node.
    pub expanded_edges: usize,
}

impl TreeStats {
    /// Average moves per node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.node_count == 0 {
            0.0
        } else {
            self.total_edges as f64 / self.node_count as f64
        }
    }

    /// Expanded edges / total edges.
    #[must_use]
    pub fn expansion_ratio(&self) -> f64 {
        if self.total_edges == 0 {
            0.0
        } else {
            self.expanded_edges as f64 / self.total_edges as f64
        }
    }
}
