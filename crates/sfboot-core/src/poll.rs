//! Bounded busy-wait polling
//!
//! Every wait in the stack (receive FIFO per byte, flash busy bit) is a fixed
//! number of checks separated by a fixed delay. There are no interrupts and no
//! cancellation: a caller only learns about a timeout after the budget is spent.

use crate::error::Result;

/// A poll budget: `attempts` checks, each followed by `interval_us` of delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    /// Number of readiness checks
    pub attempts: u32,
    /// Delay after each unsuccessful check, in microseconds
    pub interval_us: u32,
}

impl PollBudget {
    /// Create a budget from an explicit attempt count
    pub const fn new(attempts: u32, interval_us: u32) -> Self {
        Self {
            attempts,
            interval_us,
        }
    }

    /// Budget for a millisecond timeout polled every 100 µs (`timeout * 10` checks)
    pub const fn from_millis(timeout_ms: u32) -> Self {
        Self::new(timeout_ms.saturating_mul(10), 100)
    }
}

/// Outcome of a poll loop that did not hit an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition held after this many checks (1-based)
    Ready(u32),
    /// The budget ran out
    Exhausted,
}

impl PollOutcome {
    /// True if the condition was observed
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Poll `ready` until it returns `true` or the budget is exhausted
///
/// `target` is handed to both closures so the check and the delay can borrow
/// the same device mutably. Errors returned by `ready` abort the loop and are
/// propagated unchanged.
pub fn poll_until<T: ?Sized>(
    target: &mut T,
    budget: PollBudget,
    mut ready: impl FnMut(&mut T) -> Result<bool>,
    mut wait: impl FnMut(&mut T, u32),
) -> Result<PollOutcome> {
    for attempt in 1..=budget.attempts {
        if ready(target)? {
            return Ok(PollOutcome::Ready(attempt));
        }
        wait(target, budget.interval_us);
    }
    Ok(PollOutcome::Exhausted)
}
