//! MCTS configuration parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Order in which untried moves are expanded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpansionOrder {
    /// Uniformly at random among untried moves (seeded).
    Random,
    /// First untried move in enumeration order.
    InOrder,
}

/// MCTS configuration parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MCTSConfig {
    /// UCT exploration constant (default: sqrt(2)).
    /// Higher values favor exploration over exploitation.
    pub exploration_constant: f64,

    /// Iterations per decision (None = limited by time only).
    pub iteration_budget: Option<u64>,

    /// Wall-clock limit per decision (None = limited by iterations only).
    pub time_budget_ms: Option<u64>,

    /// Keep the subtree of the committed move between decisions.
    pub retain_tree_across_turns: bool,

    pub expansion: ExpansionOrder,

    /// Maximum nodes in the arena. The search stops when reached.
    pub max_nodes: usize,

    /// Rollouts run from each newly expanded node. Values above 1 run in
    /// parallel.
    pub rollouts_per_leaf: u32,

    /// Truncate rollouts after this many moves and score the position with
    /// the search's evaluator. Ignored when no evaluator is set.
    pub rollout_cutoff: Option<u32>,

    /// Random seed for expansion and rollouts.
    /// Same seed produces deterministic searches.
    pub seed: u64,
}

impl Default for MCTSConfig {
    fn default() -> Self {
        Self {
            exploration_constant: std::f64::consts::SQRT_2,
            iteration_budget: Some(1000),
            time_budget_ms: None,
            retain_tree_across_turns: false,
            expansion: ExpansionOrder::Random,
            max_nodes: 1_000_000,
            rollouts_per_leaf: 1,
            rollout_cutoff: None,
            seed: 42,
        }
    }
}

impl MCTSConfig {
    pub fn with_exploration(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_iterations(mut self, iterations: Option<u64>) -> Self {
        self.iteration_budget = iterations;
        self
    }

    pub fn with_time_budget_ms(mut self, ms: Option<u64>) -> Self {
        self.time_budget_ms = ms;
        self
    }

    pub fn with_retain_tree(mut self, retain: bool) -> Self {
        self.retain_tree_across_turns = retain;
        self
    }

    pub fn with_expansion(mut self, order: ExpansionOrder) -> Self {
        self.expansion = order;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_rollouts_per_leaf(mut self, rollouts: u32) -> Self {
        self.rollouts_per_leaf = rollouts;
        self
    }

    pub fn with_rollout_cutoff(mut self, moves: Option<u32>) -> Self {
        self.rollout_cutoff = moves;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_budget.is_none() && self.time_budget_ms.is_none() {
            return Err(ConfigError::Validation(
                "mcts needs an iteration_budget or a time_budget_ms".into(),
            ));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(ConfigError::Validation(format!(
                "mcts.exploration_constant must be finite and non-negative, got {}",
                self.exploration_constant
            )));
        }
        if self.rollouts_per_leaf == 0 {
            return Err(ConfigError::Validation(
                "mcts.rollouts_per_leaf must be at least 1".into(),
            ));
        }
        if self.max_nodes < 2 {
            return Err(ConfigError::Validation(
                "mcts.max_nodes must allow at least one child".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MCTSConfig::default();
        assert!((config.exploration_constant - std::f64::consts::SQRT_2).abs() < 0.001);
        assert_eq!(config.iteration_budget, Some(1000));
        assert_eq!(config.seed, 42);
        assert!(!config.retain_tree_across_turns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = MCTSConfig::default()
            .with_exploration(2.0)
            .with_seed(123)
            .with_iterations(None)
            .with_time_budget_ms(Some(50))
            .with_expansion(ExpansionOrder::InOrder);

        assert_eq!(config.exploration_constant, 2.0);
        assert_eq!(config.seed, 123);
        assert_eq!(config.time_budget(), Some(Duration::from_millis(50)));
        assert_eq!(config.expansion, ExpansionOrder::InOrder);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let no_budget = MCTSConfig::default().with_iterations(None);
        assert!(no_budget.validate().is_err());
        assert!(MCTSConfig::default().with_exploration(-1.0).validate().is_err());
        assert!(MCTSConfig::default().with_rollouts_per_leaf(0).validate().is_err());
        assert!(MCTSConfig::default().with_max_nodes(1).validate().is_err());
    }

    #[test]
    fn test_serialization() {
        let config = MCTSConfig::default().with_retain_tree(true);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MCTSConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
