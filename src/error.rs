//! Error taxonomy.
//!
//! Contract violations between games and agents (`GameError`) are programmer
//! errors and are surfaced immediately. Budget exhaustion is not an error:
//! searches report it through their stats. Replay underflow is recovered
//! inside the training loop.

use std::path::PathBuf;

use thiserror::Error;

/// Violations of the `Game` / `Agent` contracts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Malformed or unexpected state passed to a game method.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Move not legal in the given state.
    #[error("illegal move: {0}")]
    IllegalMove(String),

    /// Utility requested on a non-terminal state.
    #[error("utility requested on a non-terminal state")]
    NotTerminal,

    /// Decision requested on a terminal state.
    #[error("no legal move: the state is terminal")]
    NoLegalMove,
}

/// Convenience result for game and agent operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors that can occur while training a learning agent.
#[derive(Debug, Error)]
pub enum TrainingError {
    /// A training step was attempted before the buffer held enough entries.
    #[error("replay buffer holds {len} entries, {required} required before training")]
    ReplayUnderflow { len: usize, required: usize },

    #[error("game contract violation: {0}")]
    Game(#[from] GameError),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("config validation error: {0}")]
    Config(String),
}

/// Errors from saving, loading, or restoring Q-function parameters.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode or decode parameters: {0}")]
    Encode(#[from] bincode::Error),

    #[error("incompatible checkpoint: {0}")]
    Incompatible(String),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
