//! # Fibonacci Backoff
//!
//! Progressive delays between read attempts while a new version propagates.
//!
//! With a 500ms minimum the sequence is 500ms, 500ms, 1s, 1.5s, 2.5s, 4s, ...
//! capped at the configured maximum.

use std::time::Duration;

/// Fibonacci backoff state for one retry loop
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    previous: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        Self {
            previous: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Delay before the next attempt, advancing the sequence
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current.min(self.max);
        let next = self.previous.saturating_add(self.current);
        self.previous = self.current;
        self.current = next.min(self.max);
        delay
    }
}
