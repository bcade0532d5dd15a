//! Function-approximator contract for value-based agents.
//!
//! The learning agents never depend on a concrete model: they consume a
//! [`QFunction`], which maps an encoded state to one value per action index,
//! trains on batches of (state, action, target) samples, and can be
//! snapshotted and restored (target-network sync and checkpoints).

use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;

/// Encoded game state as a flat tensor for model input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor (e.g., [features] or [channels, height, width]).
    pub shape: Vec<usize>,
}

impl EncodedState {
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// One-dimensional feature vector.
    pub fn flat(tensor: Vec<f32>) -> Self {
        let len = tensor.len();
        Self::new(tensor, vec![len])
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self {
            tensor: vec![0.0; size],
            shape,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

/// One regression sample: move `Q(input, action)` towards `target`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub input: EncodedState,
    pub action: usize,
    pub target: f32,
}

/// A batch applied as a single optimization step.
pub type TrainingBatch = [TrainingSample];

/// Opaque serialized parameters of a [`QFunction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QSnapshot(pub Vec<u8>);

impl QSnapshot {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Trainable mapping from an encoded state to one value per action.
pub trait QFunction: Send + Sync {
    /// Size of the action space (length of `predict` output).
    fn action_count(&self) -> usize;

    /// Expected input feature count.
    fn feature_count(&self) -> usize;

    /// Value estimate for every action index.
    fn predict(&self, state: &EncodedState) -> Vec<f32>;

    /// Batch prediction (override for vectorized models).
    fn predict_batch(&self, states: &[EncodedState]) -> Vec<Vec<f32>> {
        states.iter().map(|s| self.predict(s)).collect()
    }

    /// Apply one optimization step for the whole batch and return the loss
    /// measured before the update. A batch is applied entirely or not at all.
    fn train(&mut self, batch: &TrainingBatch, learning_rate: f32) -> f32;

    /// Capture the current parameters.
    fn snapshot(&self) -> Result<QSnapshot, CheckpointError>;

    /// Overwrite the parameters with a snapshot taken from a compatible model.
    fn restore(&mut self, snapshot: &QSnapshot) -> Result<(), CheckpointError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_state_flat() {
        let state = EncodedState::flat(vec![1.0, 2.0, 3.0]);
        assert_eq!(state.len(), 3);
        assert_eq!(state.shape, vec![3]);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_encoded_state_zeros() {
        let state = EncodedState::zeros(vec![2, 3]);
        assert_eq!(state.len(), 6);
        assert!(state.tensor.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_serialization() {
        let sample = TrainingSample {
            input: EncodedState::flat(vec![0.5, 1.0]),
            action: 1,
            target: -0.25,
        };
        let json = serde_json::to_string(&sample).unwrap();
        let back: TrainingSample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, back);
    }
}
