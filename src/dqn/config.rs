//! DQN hyperparameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::training::ReplaySharing;

/// Shape of the exploration rate decay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpsilonSchedule {
    /// Straight line from start to end.
    Linear,
    /// Geometric interpolation `start * (end / start)^progress`; needs a
    /// positive `epsilon_end`.
    Exponential,
}

/// Whether all seats share one online network or each learns its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkSharing {
    Shared,
    PerPlayer,
}

/// DQN hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DQNConfig {
    /// Discount factor in [0, 1].
    pub discount: f64,
    pub epsilon_start: f64,
    pub epsilon_end: f64,
    /// Environment steps over which epsilon moves from start to end.
    pub epsilon_decay_steps: u64,
    pub epsilon_schedule: EpsilonSchedule,
    pub replay_capacity: usize,
    /// Training steps are skipped until a buffer holds this many entries.
    pub min_replay_size: usize,
    pub batch_size: usize,
    /// Hard target sync every this many training steps.
    pub target_update_frequency: u64,
    pub learning_rate: f32,
    pub network_sharing: NetworkSharing,
    pub replay_sharing: ReplaySharing,
    /// Training steps attempted after each environment step.
    pub train_steps_per_env_step: u32,
    /// Episodes longer than this are abandoned.
    pub max_episode_moves: usize,
    /// Self-play threads in concurrent training.
    pub producer_threads: usize,
    pub seed: u64,
}

impl Default for DQNConfig {
    fn default() -> Self {
        Self {
            discount: 0.99,
            epsilon_start: 1.0,
            epsilon_end: 0.05,
            epsilon_decay_steps: 10_000,
            epsilon_schedule: EpsilonSchedule::Linear,
            replay_capacity: 50_000,
            min_replay_size: 500,
            batch_size: 32,
            target_update_frequency: 500,
            learning_rate: 0.01,
            network_sharing: NetworkSharing::Shared,
            replay_sharing: ReplaySharing::Shared,
            train_steps_per_env_step: 1,
            max_episode_moves: 10_000,
            producer_threads: 2,
            seed: 42,
        }
    }
}

impl DQNConfig {
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_epsilon(mut self, start: f64, end: f64, decay_steps: u64) -> Self {
        self.epsilon_start = start;
        self.epsilon_end = end;
        self.epsilon_decay_steps = decay_steps;
        self
    }

    pub fn with_schedule(mut self, schedule: EpsilonSchedule) -> Self {
        self.epsilon_schedule = schedule;
        self
    }

    pub fn with_replay(mut self, capacity: usize, min_size: usize) -> Self {
        self.replay_capacity = capacity;
        self.min_replay_size = min_size;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_target_update_frequency(mut self, steps: u64) -> Self {
        self.target_update_frequency = steps;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_sharing(mut self, network: NetworkSharing, replay: ReplaySharing) -> Self {
        self.network_sharing = network;
        self.replay_sharing = replay;
        self
    }

    pub fn with_producer_threads(mut self, threads: usize) -> Self {
        self.producer_threads = threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_episode_moves(mut self, moves: usize) -> Self {
        self.max_episode_moves = moves;
        self
    }

    /// Exploration rate after `step` environment steps.
    #[must_use]
    pub fn epsilon_at(&self, step: u64) -> f64 {
        if self.epsilon_decay_steps == 0 {
            return self.epsilon_end;
        }
        let progress = (step as f64 / self.epsilon_decay_steps as f64).min(1.0);
        match self.epsilon_schedule {
            EpsilonSchedule::Linear => {
                self.epsilon_start + (self.epsilon_end - self.epsilon_start) * progress
            }
            EpsilonSchedule::Exponential => {
                if self.epsilon_start <= 0.0 {
                    return self.epsilon_end;
                }
                self.epsilon_start * (self.epsilon_end / self.epsilon_start).powf(progress)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::Validation(msg));

        if !(0.0..=1.0).contains(&self.discount) {
            return fail(format!("dqn.discount must be in [0, 1], got {}", self.discount));
        }
        if !(0.0..=1.0).contains(&self.epsilon_start) || !(0.0..=1.0).contains(&self.epsilon_end) {
            return fail("dqn.epsilon_start and dqn.epsilon_end must be in [0, 1]".into());
        }
        if self.epsilon_schedule == EpsilonSchedule::Exponential && self.epsilon_end <= 0.0 {
            return fail("dqn.epsilon_end must be positive for the exponential schedule".into());
        }
        if self.batch_size == 0 {
            return fail("dqn.batch_size must be at least 1".into());
        }
        if self.replay_capacity == 0 || self.min_replay_size > self.replay_capacity {
            return fail(format!(
                "dqn.min_replay_size ({}) must not exceed a non-zero replay_capacity ({})",
                self.min_replay_size, self.replay_capacity
            ));
        }
        if self.target_update_frequency == 0 {
            return fail("dqn.target_update_frequency must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return fail(format!(
                "dqn.learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }
        if self.network_sharing == NetworkSharing::PerPlayer
            && self.replay_sharing == ReplaySharing::Shared
        {
            return fail("per-player networks need per-player replay buffers".into());
        }
        if self.max_episode_moves == 0 {
            return fail("dqn.max_episode_moves must be at least 1".into());
        }
        Ok(())
    }
}
