//! DFS configuration parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bounds that make max-n pruning sound.
///
/// Every reward vector the search can see (terminal utilities and evaluator
/// estimates) must have non-negative entries, each at most `max_value`, and
/// entries summing to at most `max_sum`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PruningBounds {
    /// Upper bound on any single player's reward.
    pub max_value: f64,
    /// Upper bound on the sum of a reward vector.
    pub max_sum: f64,
}

impl PruningBounds {
    pub fn new(max_value: f64, max_sum: f64) -> Self {
        Self { max_value, max_sum }
    }
}

/// How players other than the one to act are assumed to choose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Every player maximizes its own reward (max-n).
    #[default]
    MaxN,
    /// Every other player minimizes the root player's reward. Reduces the
    /// game to two players so alpha-beta applies.
    Paranoid,
}

/// DFS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DFSConfig {
    /// Depth limit in plies. Positions at this depth are scored by the
    /// evaluator.
    pub max_depth: u32,

    /// Wall-clock limit per decision (None = unlimited).
    pub time_budget_ms: Option<u64>,

    /// Search depths 1..=max_depth in order so an interrupted search still
    /// has a completed answer.
    pub iterative_deepening: bool,

    pub mode: SearchMode,

    /// Enable immediate and shallow pruning under these bounds (max-n only).
    pub pruning: Option<PruningBounds>,

    /// Alpha-beta cut-offs in paranoid mode.
    pub alpha_beta: bool,

    /// Capacity of the LRU transposition table used to order moves
    /// (None = no table). The table persists across decisions.
    pub transposition_capacity: Option<usize>,
}

impl Default for DFSConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            time_budget_ms: None,
            iterative_deepening: true,
            mode: SearchMode::MaxN,
            pruning: None,
            alpha_beta: true,
            transposition_capacity: None,
        }
    }
}

impl DFSConfig {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_time_budget_ms(mut self, ms: Option<u64>) -> Self {
        self.time_budget_ms = ms;
        self
    }

    pub fn with_iterative_deepening(mut self, enabled: bool) -> Self {
        self.iterative_deepening = enabled;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pruning(mut self, bounds: Option<PruningBounds>) -> Self {
        self.pruning = bounds;
        self
    }

    pub fn with_alpha_beta(mut self, enabled: bool) -> Self {
        self.alpha_beta = enabled;
        self
    }

    pub fn with_transposition_table(mut self, capacity: Option<usize>) -> Self {
        self.transposition_capacity = capacity;
        self
    }

    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Validation(
                "dfs.max_depth must be at least 1".into(),
            ));
        }
        if self.transposition_capacity == Some(0) {
            return Err(ConfigError::Validation(
                "dfs.transposition_capacity must be at least 1".into(),
            ));
        }
        if let Some(bounds) = self.pruning {
            if self.mode == SearchMode::Paranoid {
                return Err(ConfigError::Validation(
                    "dfs.pruning bounds apply to max-n only; paranoid mode uses alpha_beta".into(),
                ));
            }
            if !(bounds.max_value >= 0.0 && bounds.max_sum >= 0.0) {
                return Err(ConfigError::Validation(format!(
                    "dfs.pruning bounds must be non-negative, got {bounds:?}"
                )));
            }
            if bounds.max_value > bounds.max_sum {
                return Err(ConfigError::Validation(format!(
                    "dfs.pruning.max_value ({}) exceeds max_sum ({})",
                    bounds.max_value, bounds.max_sum
                )));
            }
        }
        Ok(())
    }
}
