//! Validation games.
//!
//! Concrete rule sets are outside the agents' concern; these two small games
//! exist to check agents against known-optimal play:
//!
//! - [`TreeGame`]: an explicit N-player tree with score vectors at vertices
//! - [`Nim`]: N-player subtraction Nim, last stone wins

mod nim;
mod tree;

pub use nim::{Nim, NimEncoder, NimState, Take};
pub use tree::{Branch, TreeEncoder, TreeGame, TreeSpec, TreeState};
