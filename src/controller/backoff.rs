//! # Fibonacci Backoff
//!
//! Per-resource retry delays that grow along the Fibonacci sequence
//! (1, 1, 2, 3, 5, 8, ...) scaled by a minimum and capped at a maximum.

/// Fibonacci backoff calculator, in seconds
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    min_secs: u64,
    max_secs: u64,
    previous: u64,
    current: u64,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min_secs` and never exceeding `max_secs`
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        let min_secs = min_secs.max(1);
        Self {
            min_secs,
            max_secs: max_secs.max(min_secs),
            previous: 0,
            current: 1,
        }
    }

    /// Next delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let delay = self.current.saturating_mul(self.min_secs).min(self.max_secs);
        if delay < self.max_secs {
            let next = self.previous.saturating_add(self.current);
            self.previous = self.current;
            self.current = next;
        }
        delay
    }
}

/// Backoff bookkeeping for one resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_follows_fibonacci() {
        let mut backoff = FibonacciBackoff::new(1, 100);
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(delays, [1, 1, 2, 3, 5, 8, 13]);
    }

    #[test]
    fn test_sequence_scales_by_min_and_caps_at_max() {
        let mut backoff = FibonacciBackoff::new(2, 10);
        let delays: Vec<u64> = (0..7).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(delays, [2, 2, 4, 6, 10, 10, 10]);
    }
}
