//! Game contract consumed by every agent.
//!
//! Games implement [`Game`] to define:
//! - Legal moves for each state (and an optional pass move)
//! - How moves produce successor states
//! - Terminal detection and per-player utilities
//!
//! Agents call into `Game` but never interpret game-specific concepts.

pub mod rules;

pub use rules::{check_legal, check_utility_len, playable_moves, Game};
