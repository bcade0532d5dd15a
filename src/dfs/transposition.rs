//! Bounded LRU table of backed-up values, used to order moves.

use std::collections::BTreeMap;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::core::{PlayerId, Utility};

struct Slot {
    value: Utility,
    stamp: u64,
}

/// Least-recently-used map from positions to the reward vector the search
/// last backed up for them.
///
/// Values may come from shallower or cut-off searches, so they only guide
/// move ordering and never replace a search.
pub struct TranspositionTable<S> {
    capacity: usize,
    slots: FxHashMap<S, Slot>,
    /// Use stamp -> key, oldest first.
    order: BTreeMap<u64, S>,
    clock: u64,
}

impl<S: Clone + Eq + Hash> TranspositionTable<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: FxHashMap::default(),
            order: BTreeMap::new(),
            clock: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.clock = 0;
    }

    /// Value stored for `state`, marking it most recently used.
    pub fn get(&mut self, state: &S) -> Option<&Utility> {
        let stamp = self.tick();
        let slot = self.slots.get_mut(state)?;
        self.order.remove(&slot.stamp);
        self.order.insert(stamp, state.clone());
        slot.stamp = stamp;
        Some(&slot.value)
    }

    /// One player's entry of the stored value.
    pub fn score(&mut self, state: &S, player: PlayerId) -> Option<f64> {
        self.get(state).map(|value| value[player])
    }

    /// Store `value` for `state`, evicting the least recently used entry
    /// when full.
    pub fn insert(&mut self, state: S, value: Utility) {
        let stamp = self.tick();
        if let Some(slot) = self.slots.get_mut(&state) {
            self.order.remove(&slot.stamp);
            slot.value = value;
            slot.stamp = stamp;
            self.order.insert(stamp, state);
            return;
        }
        if self.slots.len() >= self.capacity {
            if let Some((_, oldest)) = self.order.pop_first() {
                self.slots.remove(&oldest);
            }
        }
        self.order.insert(stamp, state.clone());
        self.slots.insert(state, Slot { value, stamp });
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(values: &[f64]) -> Utility {
        Utility::from_vec(values.to_vec())
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut table = TranspositionTable::new(2);
        table.insert(1u32, u(&[1.0, 0.0]));
        table.insert(2u32, u(&[2.0, 0.0]));
        // Touch 1 so 2 becomes the oldest.
        assert!(table.get(&1).is_some());
        table.insert(3u32, u(&[3.0, 0.0]));

        assert_eq!(table.len(), 2);
        assert!(table.get(&2).is_none());
        assert_eq!(table.score(&1, PlayerId::new(0)), Some(1.0));
        assert_eq!(table.score(&3, PlayerId::new(0)), Some(3.0));
    }

    #[test]
    fn test_overwrite_keeps_size() {
        let mut table = TranspositionTable::new(2);
        table.insert(7u32, u(&[0.0, 1.0]));
        table.insert(7u32, u(&[0.0, 5.0]));
        assert_eq!(table.len(), 1);
        assert_eq!(table.score(&7, PlayerId::new(1)), Some(5.0));

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 2);
    }
}
