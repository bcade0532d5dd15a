//! Core building blocks shared by games and agents: player identifiers,
//! per-player reward vectors, the deterministic RNG, and search budgets.

pub mod budget;
pub mod player;
pub mod rng;

pub use budget::{Budget, BudgetClock, CancelToken, StopReason};
pub use player::{PlayerId, PlayerMap, Utility};
pub use rng::{GameRng, GameRngState};
