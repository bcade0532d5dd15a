//! Experience collection for value-based learning.
//!
//! - **ReplayBuffer**: bounded FIFO of transitions with uniform sampling
//! - **SharedReplayBuffer / ReplayPool**: thread-shared buffers, one shared
//!   or one per player
//! - **TransitionRecorder**: splits a multi-player episode into per-player
//!   transitions

pub mod replay;
pub mod transition;

pub use replay::{ReplayBuffer, ReplayEntry, ReplayPool, ReplaySharing, SharedReplayBuffer};
pub use transition::TransitionRecorder;
