//! Search budgets: iteration counts, wall-clock limits, and external
//! cancellation.
//!
//! A `Budget` describes the limits; `BudgetClock` is started at the beginning
//! of a decision and polled between units of work (MCTS iterations, DFS node
//! expansions). Agents never abort mid-update: the clock is only checked at
//! points where all statistics are consistent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Shared flag used to stop a running search or training loop from another
/// thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Clear a previous request so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Why a budgeted loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The work finished on its own (tree exhausted, depth limit reached).
    Completed,
    /// The iteration budget was spent.
    IterationBudget,
    /// The wall-clock budget expired.
    TimeBudget,
    /// A [`CancelToken`] was triggered.
    Cancelled,
    /// A memory limit (e.g. MCTS node arena) was reached.
    NodeLimit,
}

impl StopReason {
    /// True when the search stopped early rather than by its own logic
    /// or its configured iteration count.
    #[must_use]
    pub fn is_exhaustion(self) -> bool {
        matches!(self, StopReason::TimeBudget | StopReason::Cancelled | StopReason::NodeLimit)
    }
}

/// Limits for one decision.
#[derive(Clone, Debug, Default)]
pub struct Budget {
    pub iterations: Option<u64>,
    pub time: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Budget {
    /// No limits; callers must bound the work by other means.
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn iterations(n: u64) -> Self {
        Self {
            iterations: Some(n),
            ..Self::default()
        }
    }

    pub fn time(limit: Duration) -> Self {
        Self {
            time: Some(limit),
            ..Self::default()
        }
    }

    pub fn with_iterations(mut self, n: Option<u64>) -> Self {
        self.iterations = n;
        self
    }

    pub fn with_time(mut self, limit: Option<Duration>) -> Self {
        self.time = limit;
        self
    }

    pub fn with_cancel(mut self, token: Option<CancelToken>) -> Self {
        self.cancel = token;
        self
    }

    /// Start measuring against this budget.
    #[must_use]
    pub fn start(&self) -> BudgetClock {
        let started = Instant::now();
        BudgetClock {
            started,
            deadline: self.time.map(|t| started + t),
            max_iterations: self.iterations,
            cancel: self.cancel.clone(),
        }
    }
}

/// A running budget.
#[derive(Clone, Debug)]
pub struct BudgetClock {
    started: Instant,
    deadline: Option<Instant>,
    max_iterations: Option<u64>,
    cancel: Option<CancelToken>,
}

impl BudgetClock {
    /// Check whether another unit of work may start after `done` units.
    ///
    /// Returns the reason to stop, or `None` to continue. Cancellation is
    /// reported before time expiry, time before the iteration count.
    #[must_use]
    pub fn check(&self, done: u64) -> Option<StopReason> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(StopReason::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StopReason::TimeBudget);
        }
        if self.max_iterations.is_some_and(|max| done >= max) {
            return Some(StopReason::IterationBudget);
        }
        None
    }

    /// Only the interrupting limits (cancel, time); ignores the iteration cap.
    #[must_use]
    pub fn interrupted(&self) -> Option<StopReason> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            Some(StopReason::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(StopReason::TimeBudget)
        } else {
            None
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
