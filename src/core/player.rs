//! Player identification and per-player values.
//!
//! ## PlayerId
//!
//! Type-safe, 0-based seat index supporting 1-255 players.
//!
//! ## PlayerMap
//!
//! One value per player backed by a `Vec`, indexable by `PlayerId`.
//! Reward vectors throughout the crate are `PlayerMap<f64>` (see [`Utility`]).

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Player identifier supporting 1-255 players.
///
/// Player indices are 0-based: the first player is `PlayerId(0)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw seat index (0-based).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat that acts after this one in a fixed rotation.
    #[must_use]
    pub fn next(self, player_count: usize) -> Self {
        Self(((self.index() + 1) % player_count) as u8)
    }

    /// Iterate over all player IDs for a game with `player_count` players.
    ///
    /// ```
    /// use rust_boardgames::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(3).collect();
    /// assert_eq!(players, vec![PlayerId::new(0), PlayerId::new(1), PlayerId::new(2)]);
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (0..player_count as u8).map(PlayerId)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player storage with O(1) access by `PlayerId`.
///
/// ```
/// use rust_boardgames::core::{PlayerId, PlayerMap};
///
/// let mut score: PlayerMap<f64> = PlayerMap::with_value(3, 0.0);
/// score[PlayerId::new(2)] += 1.5;
/// assert_eq!(score.as_slice(), &[0.0, 0.0, 1.5]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

/// Reward vector: one value per player.
pub type Utility = PlayerMap<f64>;

impl<T> PlayerMap<T> {
    /// Create a map with values from a factory function.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(player_count <= 255, "At most 255 players supported");

        Self {
            data: PlayerId::all(player_count).map(factory).collect(),
        }
    }

    /// Create a map with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Wrap an existing vector (one entry per seat, in seat order).
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "Must have at least 1 player");
        assert!(data.len() <= 255, "At most 255 players supported");
        Self { data }
    }

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Values in seat order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8), v))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl PlayerMap<f64> {
    /// Add another vector coordinate-wise.
    pub fn accumulate(&mut self, other: &PlayerMap<f64>) {
        for (acc, v) in self.data.iter_mut().zip(other.data.iter()) {
            *acc += *v;
        }
    }

    /// Sum of all coordinates.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
