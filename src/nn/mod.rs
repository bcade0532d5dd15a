//! Function approximation for learning agents.
//!
//! ## Overview
//!
//! - **Traits**: [`QFunction`] (predict / train / snapshot / restore)
//! - **Encoding**: [`StateEncoder`] maps game states and moves to tensors and
//!   action indices
//! - **Reference model**: [`LinearQFunction`]
//!
//! ## Usage
//!
//! ```rust
//! use rust_boardgames::nn::{EncodedState, LinearQFunction, QFunction};
//!
//! let q = LinearQFunction::new(4, 2, 7);
//! let values = q.predict(&EncodedState::flat(vec![1.0, 0.0, 0.0, 0.0]));
//! assert_eq!(values.len(), 2);
//! ```

pub mod encoder;
pub mod linear;
pub mod traits;

pub use encoder::StateEncoder;
pub use linear::LinearQFunction;
pub use traits::{EncodedState, QFunction, QSnapshot, TrainingBatch, TrainingSample};
