//! Linear action-value model.
//!
//! `Q(s, a) = w_a · s + b_a`, trained with mean-squared-error SGD. With
//! one-hot encoders this is exactly tabular Q-learning, which makes it a
//! dependable reference model for tests and small games. Larger models plug
//! in through the same [`QFunction`] trait.

use serde::{Deserialize, Serialize};

use crate::core::GameRng;
use crate::error::CheckpointError;
use crate::nn::traits::{EncodedState, QFunction, QSnapshot, TrainingBatch};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearQFunction {
    features: usize,
    actions: usize,
    /// Row-major `[actions][features + 1]`; the last column is the bias.
    weights: Vec<f32>,
}

impl LinearQFunction {
    /// Small random initial weights drawn from `seed`.
    pub fn new(features: usize, actions: usize, seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let weights = (0..actions * (features + 1))
            .map(|_| rng.gen_symmetric(0.01))
            .collect();
        Self {
            features,
            actions,
            weights,
        }
    }

    /// All-zero model.
    pub fn zeros(features: usize, actions: usize) -> Self {
        Self {
            features,
            actions,
            weights: vec![0.0; actions * (features + 1)],
        }
    }

    /// Rebuild a model from a snapshot.
    pub fn from_snapshot(snapshot: &QSnapshot) -> Result<Self, CheckpointError> {
        Ok(bincode::deserialize(snapshot.as_bytes())?)
    }

    fn row(&self, action: usize) -> &[f32] {
        let stride = self.features + 1;
        &self.weights[action * stride..(action + 1) * stride]
    }

    fn value(&self, input: &[f32], action: usize) -> f32 {
        let row = self.row(action);
        let dot: f32 = row[..self.features]
            .iter()
            .zip(input.iter())
            .map(|(w, x)| w * x)
            .sum();
        dot + row[self.features]
    }
}

impl QFunction for LinearQFunction {
    fn action_count(&self) -> usize {
        self.actions
    }

    fn feature_count(&self) -> usize {
        self.features
    }

    fn predict(&self, state: &EncodedState) -> Vec<f32> {
        (0..self.actions)
            .map(|a| self.value(&state.tensor, a))
            .collect()
    }

    fn train(&mut self, batch: &TrainingBatch, learning_rate: f32) -> f32 {
        let samples: Vec<_> = batch.iter().filter(|s| s.action < self.actions).collect();
        if samples.is_empty() {
            return 0.0;
        }

        // Gradients are accumulated against the pre-update weights and applied
        // once, so the batch is a single atomic step.
        let stride = self.features + 1;
        let mut grad = vec![0.0f32; self.weights.len()];
        let mut loss = 0.0f32;
        for sample in &samples {
            let err = self.value(&sample.input.tensor, sample.action) - sample.target;
            loss += err * err;
            let base = sample.action * stride;
            for (g, x) in grad[base..base + self.features]
                .iter_mut()
                .zip(sample.input.tensor.iter())
            {
                *g += err * x;
            }
            grad[base + self.features] += err;
        }

        let n = samples.len() as f32;
        for (w, g) in self.weights.iter_mut().zip(grad.iter()) {
            *w -= learning_rate * 2.0 * g / n;
        }
        loss / n
    }

    fn snapshot(&self) -> Result<QSnapshot, CheckpointError> {
        Ok(QSnapshot(bincode::serialize(self)?))
    }

    fn restore(&mut self, snapshot: &QSnapshot) -> Result<(), CheckpointError> {
        let other = Self::from_snapshot(snapshot)?;
        if other.features != self.features || other.actions != self.actions {
            return Err(CheckpointError::Incompatible(format!(
                "snapshot is {}x{}, model is {}x{}",
                other.features, other.actions, self.features, self.actions
            )));
        }
        *self = other;
        Ok(())
    }
}
