//! Monte Carlo Tree Search for N-player games.
//!
//! ## Overview
//!
//! - **Per-player accumulators**: every node sums the full utility vector,
//!   so selection at any node can act for whichever player moves there
//! - **UCT selection** for the player to act, robust-child final decision
//! - **Arena tree** addressed by `NodeId`, optionally retained and re-rooted
//!   across turns
//! - **Leaf parallelism**: several rollouts per expansion on the rayon pool
//!
//! ## Usage
//!
//! ```rust
//! use rust_boardgames::games::Nim;
//! use rust_boardgames::mcts::{MCTSConfig, MCTSSearch};
//!
//! let game = Nim::new(3, 2);
//! let config = MCTSConfig::default().with_iterations(Some(500)).with_seed(1);
//! let mut search = MCTSSearch::new(game.clone(), config).unwrap();
//!
//! let mv = search.search(&game.initial_state(8)).unwrap();
//! for child in search.root_statistics() {
//!     println!("{:?}: {} visits", child.mv, child.visits);
//! }
//! # let _ = mv;
//! ```

pub mod agent;
pub mod config;
pub mod node;
pub mod policy;
pub mod search;
pub mod stats;
pub mod tree;

pub use agent::MCTSAgent;
pub use config::{ExpansionOrder, MCTSConfig};
pub use node::{NodeId, SearchNode};
pub use policy::{simulate, Cutoff, RandomRollout, RolloutPolicy, SelectionPolicy, UCT};
pub use search::{ChildStats, MCTSSearch};
pub use stats::SearchStats;
pub use tree::{MCTSTree, TreeStats};
