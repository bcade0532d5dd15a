//! Deep Q-learning for N-player games.
//!
//! Every seat is played by an online [`QFunction`](crate::nn::QFunction)
//! (one shared network, or one per player). Experience is split into
//! per-player transitions, stored in bounded replay buffers and replayed
//! against a periodically synced target network.
//!
//! ```no_run
//! use rust_boardgames::dqn::{DQNConfig, DQNTrainer};
//! use rust_boardgames::games::{Nim, NimEncoder};
//! use rust_boardgames::nn::{LinearQFunction, StateEncoder};
//!
//! let game = Nim::new(2, 3);
//! let encoder = NimEncoder::new(&game, 20);
//! let q = LinearQFunction::new(encoder.feature_count(), encoder.action_count(), 7);
//! let mut trainer = DQNTrainer::new(game.clone(), encoder, q, DQNConfig::default()).unwrap();
//! let report = trainer.train(&game.initial_state(20), 1_000).unwrap();
//! println!("{} training steps", report.train_steps);
//! ```

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod episode;
pub mod policy;
pub mod trainer;

pub use agent::DQNAgent;
pub use checkpoint::{Checkpoint, LearnerState, ResumeState, CHECKPOINT_FORMAT_VERSION};
pub use config::{DQNConfig, EpsilonSchedule, NetworkSharing};
pub use episode::{EpisodeOutcome, EpisodeRunner};
pub use policy::{epsilon_greedy, legal_actions, masked_argmax, masked_max, move_for_action};
pub use trainer::{DQNTrainer, Learner, TrainerPhase, TrainingReport};
