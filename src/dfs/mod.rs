//! Depth-first N-player search (max-n or paranoid).
//!
//! ```
//! use rust_boardgames::dfs::{DFSAgent, DFSConfig};
//! use rust_boardgames::games::{Branch, TreeGame, TreeSpec, TreeState};
//! use rust_boardgames::agent::Agent;
//!
//! let game = TreeGame::new(2, TreeSpec::branch(vec![
//!     TreeSpec::leaf(&[0.0, 1.0]),
//!     TreeSpec::leaf(&[1.0, 0.0]),
//! ])).unwrap();
//! let heuristic = |g: &TreeGame, s: &TreeState| g.heuristic(s);
//! let mut agent = DFSAgent::new(game.clone(), heuristic, DFSConfig::default()).unwrap();
//! assert_eq!(agent.decide(&game.initial_state()).unwrap(), Branch(1));
//! ```

mod agent;
mod config;
mod evaluator;
mod search;
mod transposition;

pub use agent::DFSAgent;
pub use config::{DFSConfig, PruningBounds, SearchMode};
pub use evaluator::{ConstantEvaluator, Evaluator};
pub use search::{DFSOutcome, DFSSearch, DFSStats};
pub use transposition::TranspositionTable;
