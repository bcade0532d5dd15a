//! Turns a sequence of moves into per-player replay entries.
//!
//! A player's transition runs from one of its decision points to its next
//! one, so everything the other seats do in between is part of the
//! environment. The transition completes when the same player acts again
//! (reward 0) or when the game ends (reward = that player's utility).

use crate::core::{PlayerId, Utility};
use crate::nn::EncodedState;

use super::replay::ReplayEntry;

#[derive(Clone, Debug)]
struct Pending {
    state: EncodedState,
    action: usize,
}

/// Per-player open transitions of one episode.
#[derive(Clone, Debug)]
pub struct TransitionRecorder {
    pending: Vec<Option<Pending>>,
}

impl TransitionRecorder {
    pub fn new(player_count: usize) -> Self {
        Self {
            pending: vec![None; player_count],
        }
    }

    /// `player` chooses `action` in `state` (encoded from its perspective,
    /// with `legal` action indices).
    ///
    /// Returns the player's previous transition, now complete.
    pub fn act(
        &mut self,
        player: PlayerId,
        state: EncodedState,
        legal: Vec<usize>,
        action: usize,
    ) -> Option<ReplayEntry> {
        let slot = &mut self.pending[player.index()];
        let completed = slot.take().map(|prev| ReplayEntry {
            state: prev.state,
            action: prev.action,
            player,
            reward: 0.0,
            next_state: state.clone(),
            next_legal: legal,
            done: false,
        });
        *slot = Some(Pending { state, action });
        completed
    }

    /// Close every open transition with the terminal utility.
    ///
    /// `terminal` encodes the final state from a player's perspective.
    /// Entries come out in seat order.
    pub fn finish(
        &mut self,
        utility: &Utility,
        terminal: impl Fn(PlayerId) -> EncodedState,
    ) -> Vec<ReplayEntry> {
        let mut entries = Vec::new();
        for (seat, slot) in self.pending.iter_mut().enumerate() {
            let player = PlayerId::new(seat as u8);
            if let Some(prev) = slot.take() {
                entries.push(ReplayEntry {
                    state: prev.state,
                    action: prev.action,
                    player,
                    reward: utility[player],
                    next_state: terminal(player),
                    next_legal: Vec::new(),
                    done: true,
                });
            }
        }
        entries
    }

    /// Number of players with an open transition.
    pub fn open(&self) -> usize {
        self.pending.iter().filter(|p| p.is_some()).count()
    }
}
