//! Experience replay storage.
//!
//! Uses a FIFO strategy: when full, the oldest entries are evicted. The
//! learner and the self-play producers share buffers through
//! [`SharedReplayBuffer`], the only structure the concurrent trainer
//! shares between threads.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::core::{GameRng, PlayerId};
use crate::error::TrainingError;
use crate::nn::EncodedState;

/// One stored transition, from the acting player's perspective.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayEntry {
    pub state: EncodedState,
    /// Action index chosen in `state`.
    pub action: usize,
    pub player: PlayerId,
    /// Reward for `player`: 0 until the game ends, then its utility.
    pub reward: f64,
    /// Encoding of the player's next decision point (or the terminal state).
    pub next_state: EncodedState,
    /// Legal action indices at `next_state`; empty when `done`.
    pub next_legal: Vec<usize>,
    pub done: bool,
}

/// Whether self-play players feed one buffer or one buffer each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaySharing {
    Shared,
    PerPlayer,
}

/// Bounded FIFO of replay entries.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    entries: VecDeque<ReplayEntry>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity,
        }
    }

    /// Add an entry. If the buffer is full, the oldest entry is removed.
    pub fn push(&mut self, entry: ReplayEntry) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &ReplayEntry> {
        self.entries.iter()
    }

    /// Draw `batch_size` entries uniformly with replacement.
    ///
    /// Fails with `ReplayUnderflow` while fewer than `min_size` entries (or
    /// none at all) are stored.
    pub fn sample(
        &self,
        batch_size: usize,
        min_size: usize,
        rng: &mut GameRng,
    ) -> Result<Vec<ReplayEntry>, TrainingError> {
        let required = min_size.max(1);
        if self.entries.len() < required {
            return Err(TrainingError::ReplayUnderflow {
                len: self.entries.len(),
                required,
            });
        }
        Ok((0..batch_size)
            .map(|_| self.entries[rng.gen_range_usize(0..self.entries.len())].clone())
            .collect())
    }
}

/// A [`ReplayBuffer`] behind a mutex, cloned cheaply between threads.
#[derive(Clone, Debug)]
pub struct SharedReplayBuffer {
    inner: Arc<Mutex<ReplayBuffer>>,
}

impl SharedReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ReplayBuffer::new(capacity))),
        }
    }

    // A panicking producer cannot leave a half-written entry behind, so a
    // poisoned lock still guards a consistent buffer.
    fn lock(&self) -> MutexGuard<'_, ReplayBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, entry: ReplayEntry) {
        self.lock().push(entry);
    }

    /// Append several entries under one lock.
    pub fn extend(&self, entries: impl IntoIterator<Item = ReplayEntry>) {
        let mut buffer = self.lock();
        for entry in entries {
            buffer.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn sample(
        &self,
        batch_size: usize,
        min_size: usize,
        rng: &mut GameRng,
    ) -> Result<Vec<ReplayEntry>, TrainingError> {
        self.lock().sample(batch_size, min_size, rng)
    }

    /// Copy of the current contents, oldest first.
    pub fn to_vec(&self) -> Vec<ReplayEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Drop the current contents and load `entries`, oldest first.
    pub fn replace(&self, entries: impl IntoIterator<Item = ReplayEntry>) {
        let mut buffer = self.lock();
        buffer.clear();
        for entry in entries {
            buffer.push(entry);
        }
    }
}

/// The buffers used by one self-play setup.
#[derive(Clone, Debug)]
pub struct ReplayPool {
    sharing: ReplaySharing,
    buffers: Vec<SharedReplayBuffer>,
}

impl ReplayPool {
    pub fn new(sharing: ReplaySharing, player_count: usize, capacity: usize) -> Self {
        let count = match sharing {
            ReplaySharing::Shared => 1,
            ReplaySharing::PerPlayer => player_count.max(1),
        };
        Self {
            sharing,
            buffers: (0..count).map(|_| SharedReplayBuffer::new(capacity)).collect(),
        }
    }

    pub fn sharing(&self) -> ReplaySharing {
        self.sharing
    }

    /// Buffer that receives `player`'s transitions.
    pub fn buffer_for(&self, player: PlayerId) -> &SharedReplayBuffer {
        match self.sharing {
            ReplaySharing::Shared => &self.buffers[0],
            ReplaySharing::PerPlayer => &self.buffers[player.index() % self.buffers.len()],
        }
    }

    /// Route an entry by its acting player.
    pub fn push(&self, entry: ReplayEntry) {
        self.buffer_for(entry.player).push(entry);
    }

    pub fn buffers(&self) -> &[SharedReplayBuffer] {
        &self.buffers
    }

    pub fn total_len(&self) -> usize {
        self.buffers.iter().map(SharedReplayBuffer::len).sum()
    }
}
