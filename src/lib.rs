//! # rust-boardgames
//!
//! Game-agnostic agents for deterministic, perfect-information, turn-based
//! games with any number of players.
//!
//! ## Design Principles
//!
//! 1. **N-Player First**: Rewards are vectors with one entry per seat. No
//!    API assumes two players or zero-sum payoffs.
//!
//! 2. **Rules Stay Outside**: Agents only see the [`Game`] contract. States
//!    are immutable values and moves are opaque.
//!
//! 3. **Reproducible**: Every stochastic component takes a seeded
//!    [`GameRng`]; the same seed gives the same decisions.
//!
//! ## Agents
//!
//! - **DFS** (`dfs`): max-n or paranoid search with an explicit stack,
//!   shallow or alpha-beta pruning, transposition-table move ordering,
//!   iterative deepening under a time budget.
//!
//! - **MCTS** (`mcts`): UCT over per-player value accumulators, arena tree
//!   with optional retention across turns, leaf-parallel rollouts.
//!
//! - **DQN** (`dqn`): epsilon-greedy self-play over masked Q-values,
//!   experience replay, target network, checkpoints.
//!
//! ## Modules
//!
//! - `core`: Players, reward vectors, RNG, budgets
//! - `game`: The `Game` contract and pass-move policy
//! - `games`: Validation games (synthetic tree, Nim)
//! - `agent`: The `Agent` contract, random baseline, match runner
//! - `nn`: Q-function and state encoder contracts
//! - `training`: Replay buffers and per-player transitions
//! - `config`: TOML configuration for all agents

pub mod agent;
pub mod config;
pub mod core;
pub mod dfs;
pub mod dqn;
pub mod error;
pub mod game;
pub mod games;
pub mod mcts;
pub mod nn;
pub mod training;

// Re-export commonly used types
pub use crate::core::{
    Budget, CancelToken, GameRng, GameRngState, PlayerId, PlayerMap, StopReason, Utility,
};

pub use crate::error::{CheckpointError, ConfigError, GameError, GameResult, TrainingError};

pub use crate::game::{playable_moves, Game};

pub use crate::agent::{play_match, Agent, MatchOptions, MatchRecord, RandomAgent};

pub use crate::dfs::{DFSAgent, DFSConfig, DFSStats, Evaluator, PruningBounds, SearchMode};

pub use crate::mcts::{MCTSAgent, MCTSConfig, RolloutPolicy, SearchStats};

pub use crate::dqn::{
    Checkpoint, DQNAgent, DQNConfig, DQNTrainer, EpsilonSchedule, NetworkSharing,
    TrainingReport,
};

pub use crate::nn::{EncodedState, LinearQFunction, QFunction, QSnapshot, StateEncoder};

pub use crate::training::{ReplayBuffer, ReplayEntry, ReplaySharing};

pub use crate::config::AppConfig;
