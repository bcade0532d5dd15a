//! MCTS search statistics for diagnostics and tuning.

use serde::{Deserialize, Serialize};

use crate::core::StopReason;

/// Statistics collected during one MCTS decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchStats {
    /// Completed iterations (select, expand, simulate, backpropagate).
    pub iterations: u64,

    /// Nodes added to the tree.
    pub nodes_expanded: u64,

    /// Rollouts performed.
    pub simulations: u64,

    /// Maximum depth reached during search.
    pub max_depth: u16,

    /// Total time spent searching (microseconds).
    pub time_us: u64,

    /// Root visits when the search stopped, including retained visits.
    pub root_visits: u32,

    /// Visits of the chosen child.
    pub best_visits: u32,

    /// Mean reward of the chosen child for the player to act at the root.
    pub best_mean_reward: f64,

    pub stop_reason: StopReason,
}

impl Default for SearchStats {
    fn default() -> Self {
        Self {
            iterations: 0,
            nodes_expanded: 0,
            simulations: 0,
            max_depth: 0,
            time_us: 0,
            root_visits: 0,
            best_visits: 0,
            best_mean_reward: 0.0,
            stop_reason: StopReason::Completed,
        }
    }
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when time, cancellation or the node limit ended the search.
    #[must_use]
    pub fn budget_exhausted(&self) -> bool {
        self.stop_reason.is_exhaustion()
    }

    #[must_use]
    pub fn iterations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.iterations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }

    #[must_use]
    pub fn simulations_per_second(&self) -> f64 {
        if self.time_us == 0 {
            0.0
        } else {
            self.simulations as f64 / (self.time_us as f64 / 1_000_000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = SearchStats::new();
        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.simulations, 0);
        assert_eq!(stats.stop_reason, StopReason::Completed);
        assert!(!stats.budget_exhausted());
    }

    #[test]
    fn test_stats_iterations_per_second() {
        let mut stats = SearchStats::new();
        stats.iterations = 1000;
        stats.time_us = 1_000_000; // 1 second

        assert_eq!(stats.iterations_per_second(), 1000.0);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = SearchStats::new();
        stats.iterations = 100;
        stats.stop_reason = StopReason::TimeBudget;
        assert!(stats.budget_exhausted());

        stats.reset();

        assert_eq!(stats.iterations, 0);
        assert_eq!(stats.stop_reason, StopReason::Completed);
    }

    #[test]
    fn test_stats_serialization() {
        let mut stats = SearchStats::new();
        stats.iterations = 42;
        stats.stop_reason = StopReason::IterationBudget;

        let json = serde_json::to_string(&stats).unwrap();
        let deserialized: SearchStats = serde_json::from_str(&json).unwrap();

        assert_eq!(stats.iterations, deserialized.iterations);
        assert_eq!(deserialized.stop_reason, StopReason::IterationBudget);
    }
}
