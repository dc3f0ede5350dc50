use std::time::{Duration, Instant};

/// Deadline-based repeating timer for the view loops.
///
/// The ticker owns no thread; the loop waits on `timeout` and asks `poll`
/// whether a tick is due. Dropping the loop drops the timer.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// A ticker whose first tick is due at `now`.
    pub fn new(period: Duration, now: Instant) -> Self {
        Ticker { period, next: now }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period, re-timing the pending deadline from the last tick.
    pub fn set_period(&mut self, period: Duration) {
        if period == self.period {
            return;
        }
        let last = self.next.checked_sub(self.period).unwrap_or(self.next);
        self.period = period;
        self.next = last + period;
    }

    /// Time left until the next tick, zero when overdue.
    pub fn timeout(&self, now: Instant) -> Duration {
        self.next.saturating_duration_since(now)
    }

    /// Report at most one due tick and schedule the next deadline.
    ///
    /// A loop that fell more than a period behind re-anchors on `now`
    /// instead of firing a burst of catch-up ticks.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next += self.period;
        if self.next <= now {
            self.next = now + self.period;
        }
        true
    }
}
