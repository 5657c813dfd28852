//! Cooperative termination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Stopping rule shared by all workers of a solve.
///
/// Checked only between iterations, so a worker always stops with a
/// complete, valid candidate.
#[derive(Debug, Clone, Copy)]
pub struct Termination<'a> {
    start: Instant,
    deadline: Option<Instant>,
    max_iterations: u64,
    interrupt: &'a AtomicBool,
}

impl<'a> Termination<'a> {
    /// Creates a stopping rule starting now.
    pub fn new(
        time_limit: Option<Duration>,
        max_iterations: u64,
        interrupt: &'a AtomicBool,
    ) -> Self {
        let start = Instant::now();
        Self {
            start,
            deadline: time_limit.and_then(|limit| start.checked_add(limit)),
            max_iterations,
            interrupt,
        }
    }

    /// Returns `true` once `iterations` reaches the limit, the deadline
    /// passes or the interrupt flag is raised.
    pub fn should_stop(&self, iterations: u64) -> bool {
        iterations >= self.max_iterations || self.is_interrupted() || self.time_expired()
    }

    /// Returns `true` if the interrupt flag is raised.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Returns `true` if the deadline has passed.
    pub fn time_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Returns `true` if the interrupt flag is raised or the deadline has
    /// passed, whatever the iteration count.
    pub fn is_halted(&self) -> bool {
        self.is_interrupted() || self.time_expired()
    }

    /// Time left before the deadline, `None` without a time limit.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Iterations left after `done`, capped at `chunk`.
    pub fn next_chunk(&self, done: u64, chunk: u64) -> u64 {
        self.max_iterations.saturating_sub(done).min(chunk)
    }

    /// Iteration limit per worker.
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Time since the rule was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_limit() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(None, 10, &flag);
        assert!(!t.should_stop(9));
        assert!(t.should_stop(10));
    }

    #[test]
    fn test_interrupt() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(None, u64::MAX, &flag);
        assert!(!t.should_stop(0));
        flag.store(true, Ordering::Relaxed);
        assert!(t.should_stop(0));
        assert!(t.is_interrupted());
    }

    #[test]
    fn test_next_chunk_stops_at_limit() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(None, 12, &flag);
        assert_eq!(t.next_chunk(0, 5), 5);
        assert_eq!(t.next_chunk(10, 5), 2);
        assert_eq!(t.next_chunk(12, 5), 0);
        assert_eq!(t.remaining_time(), None);
    }

    #[test]
    fn test_remaining_time_shrinks() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(Some(Duration::from_secs(60)), u64::MAX, &flag);
        let left = t.remaining_time().unwrap();
        assert!(left <= Duration::from_secs(60));
        assert!(left > Duration::from_secs(50));
        assert!(!t.is_halted());
        flag.store(true, Ordering::Relaxed);
        assert!(t.is_halted());
    }

    #[test]
    fn test_zero_time_limit() {
        let flag = AtomicBool::new(false);
        let t = Termination::new(Some(Duration::ZERO), u64::MAX, &flag);
        assert!(t.time_expired());
        assert!(t.should_stop(0));
    }
}
