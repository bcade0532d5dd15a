//! On-disk checkpoints of DQN training.
//!
//! A checkpoint is one bincode-encoded [`Checkpoint`] envelope holding the
//! online network snapshots plus the [`ResumeState`] a trainer needs to
//! continue exactly where it stopped: target networks, every counter, the
//! RNG position and the replay contents. Agents only read the online
//! snapshots. Files are written to a temporary sibling and renamed into
//! place.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::GameRngState;
use crate::error::CheckpointError;
use crate::nn::{QFunction, QSnapshot};
use crate::training::ReplayEntry;

use super::config::DQNConfig;

/// Bumped whenever the envelope layout changes.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub format_version: u32,
    pub feature_count: usize,
    pub action_count: usize,
    pub episodes: u64,
    pub env_steps: u64,
    pub train_steps: u64,
    pub epsilon: f64,
    pub config: DQNConfig,
    /// Online network parameters, one per learner (seat order when
    /// networks are per player).
    pub networks: Vec<QSnapshot>,
    pub resume: ResumeState,
}

/// Per-learner training state beyond the online parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnerState {
    pub train_steps: u64,
    pub last_loss: Option<f32>,
    pub target: QSnapshot,
}

/// Everything besides the online networks that a resumed trainer needs to
/// replay the same run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResumeState {
    pub truncated_episodes: u64,
    pub skipped_steps: u64,
    pub target_syncs: u64,
    pub loss_sum: f64,
    pub loss_count: u64,
    /// Same order as `networks`.
    pub learners: Vec<LearnerState>,
    pub rng: GameRngState,
    /// Replay buffer contents, oldest first, in pool order.
    pub replay: Vec<Vec<ReplayEntry>>,
}

impl Checkpoint {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)?;
        let io_err = |source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;

        info!(
            path = %path.display(),
            episodes = self.episodes,
            train_steps = self.train_steps,
            "checkpoint saved"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let checkpoint: Checkpoint = bincode::deserialize(&bytes)?;
        if checkpoint.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(CheckpointError::Incompatible(format!(
                "format version {} (expected {})",
                checkpoint.format_version, CHECKPOINT_FORMAT_VERSION
            )));
        }
        if checkpoint.networks.is_empty() {
            return Err(CheckpointError::Incompatible("no network parameters".into()));
        }
        if checkpoint.resume.learners.len() != checkpoint.networks.len() {
            return Err(CheckpointError::Incompatible(format!(
                "{} online networks but {} learner states",
                checkpoint.networks.len(),
                checkpoint.resume.learners.len()
            )));
        }
        Ok(checkpoint)
    }

    /// Restore network `index` into `q`, checking the input and output sizes.
    pub fn restore_into<Q: QFunction + ?Sized>(
        &self,
        index: usize,
        q: &mut Q,
    ) -> Result<(), CheckpointError> {
        self.check_shape(q)?;
        let snapshot = self
            .networks
            .get(index)
            .ok_or_else(|| missing(index, self.networks.len()))?;
        q.restore(snapshot)
    }

    /// Restore learner `index`'s target network into `q`.
    pub fn restore_target_into<Q: QFunction + ?Sized>(
        &self,
        index: usize,
        q: &mut Q,
    ) -> Result<(), CheckpointError> {
        self.check_shape(q)?;
        let learners = &self.resume.learners;
        let state = learners.get(index).ok_or_else(|| missing(index, learners.len()))?;
        q.restore(&state.target)
    }

    fn check_shape<Q: QFunction + ?Sized>(&self, q: &Q) -> Result<(), CheckpointError> {
        if q.feature_count() != self.feature_count || q.action_count() != self.action_count {
            return Err(CheckpointError::Incompatible(format!(
                "checkpoint is {}x{} (features x actions), model is {}x{}",
                self.feature_count,
                self.action_count,
                q.feature_count(),
                q.action_count()
            )));
        }
        Ok(())
    }
}

fn missing(index: usize, held: usize) -> CheckpointError {
    CheckpointError::Incompatible(format!("network {index} requested, checkpoint holds {held}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GameRng;
    use crate::nn::{EncodedState, LinearQFunction};

    fn checkpoint_for(q: &LinearQFunction) -> Checkpoint {
        let snapshot = q.snapshot().unwrap();
        Checkpoint {
            format_version: CHECKPOINT_FORMAT_VERSION,
            feature_count: q.feature_count(),
            action_count: q.action_count(),
            episodes: 3,
            env_steps: 30,
            train_steps: 12,
            epsilon: 0.4,
            config: DQNConfig::default(),
            networks: vec![snapshot.clone()],
            resume: ResumeState {
                truncated_episodes: 1,
                skipped_steps: 18,
                target_syncs: 2,
                loss_sum: 1.5,
                loss_count: 12,
                learners: vec![LearnerState {
                    train_steps: 12,
                    last_loss: Some(0.1),
                    target: snapshot,
                }],
                rng: GameRng::new(7).state(),
                replay: vec![Vec::new()],
            },
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dqn.ckpt");
        let q = LinearQFunction::new(4, 3, 11);
        let checkpoint = checkpoint_for(&q);

        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded, checkpoint);

        let mut restored = LinearQFunction::zeros(4, 3);
        loaded.restore_into(0, &mut restored).unwrap();
        let input = EncodedState::flat(vec![0.5, -1.0, 2.0, 0.0]);
        assert_eq!(q.predict(&input), restored.predict(&input));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checkpoint::load(dir.path().join("absent.ckpt")).unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ckpt");
        std::fs::write(&path, b"not a checkpoint").unwrap();
        assert!(Checkpoint::load(&path).is_err());
    }

    #[test]
    fn test_version_and_shape_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.ckpt");
        let q = LinearQFunction::new(2, 2, 0);
        let mut checkpoint = checkpoint_for(&q);
        checkpoint.format_version = 0;
        checkpoint.save(&path).unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::Incompatible(_))
        ));

        let checkpoint = checkpoint_for(&q);
        let mut wrong = LinearQFunction::zeros(3, 2);
        assert!(matches!(
            checkpoint.restore_into(0, &mut wrong),
            Err(CheckpointError::Incompatible(_))
        ));
        let mut right = LinearQFunction::zeros(2, 2);
        assert!(checkpoint.restore_into(1, &mut right).is_err());
        assert!(checkpoint.restore_target_into(1, &mut right).is_err());
        checkpoint.restore_target_into(0, &mut right).unwrap();
        assert_eq!(right, q);
    }

    #[test]
    fn test_rejects_missing_learner_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ckpt");
        let mut checkpoint = checkpoint_for(&LinearQFunction::new(2, 2, 0));
        checkpoint.resume.learners.clear();
        checkpoint.save(&path).unwrap();
        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::Incompatible(_))
        ));
    }
}
