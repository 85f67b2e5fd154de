//! Counting notification primitive
//!
//! The producer raises one permit per enqueued chip; the consumer takes one
//! permit per wake. Waits are always bounded, and a closed signal never
//! blocks, so a consumer cannot park forever after the producer is done.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Why a wait on the signal returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A permit was taken
    Raised,
    /// The timeout elapsed with no permit available
    TimedOut,
    /// The signal is closed and no permits remain
    Closed,
}

#[derive(Default)]
struct State {
    permits: u64,
    raised: u64,
    closed: bool,
}

/// Counting signal with bounded waits
#[derive(Default)]
pub struct Signal {
    state: Mutex<State>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one permit and wake one waiter
    pub fn raise(&self) {
        let mut state = self.state.lock();
        state.permits += 1;
        state.raised += 1;
        drop(state);
        self.cond.notify_one();
    }

    /// Wait for a permit for at most `timeout`.
    ///
    /// Outstanding permits are handed out before `Closed` is reported.
    pub fn wait_timeout(&self, timeout: Duration) -> Wake {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        let mut timed_out = false;

        loop {
            if state.permits > 0 {
                state.permits -= 1;
                return Wake::Raised;
            }
            if state.closed {
                return Wake::Closed;
            }
            if timed_out {
                return Wake::TimedOut;
            }
            timed_out = self.cond.wait_until(&mut state, deadline).timed_out();
        }
    }

    /// Stop blocking: wake every waiter, and make later waits return at once
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Permits not yet taken
    pub fn pending(&self) -> u64 {
        self.state.lock().permits
    }

    /// Total permits ever raised
    pub fn raised(&self) -> u64 {
        self.state.lock().raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_raise_then_wait() {
        let signal = Signal::new();
        signal.raise();
        signal.raise();
        assert_eq!(signal.pending(), 2);

        assert_eq!(signal.wait_timeout(Duration::from_millis(1)), Wake::Raised);
        assert_eq!(signal.wait_timeout(Duration::from_millis(1)), Wake::Raised);
        assert_eq!(signal.pending(), 0);
        assert_eq!(signal.raised(), 2);
    }

    #[test]
    fn test_wait_times_out() {
        let signal = Signal::new();
        let start = Instant::now();
        assert_eq!(signal.wait_timeout(Duration::from_millis(20)), Wake::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_close_drains_permits_first() {
        let signal = Signal::new();
        signal.raise();
        signal.close();

        assert_eq!(signal.wait_timeout(Duration::from_secs(5)), Wake::Raised);
        assert_eq!(signal.wait_timeout(Duration::from_secs(5)), Wake::Closed);
        assert!(signal.is_closed());
    }

    #[test]
    fn test_raise_wakes_blocked_waiter() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let s = Arc::clone(&signal);
            thread::spawn(move || {
                let start = Instant::now();
                (s.wait_timeout(Duration::from_secs(10)), start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        signal.raise();

        let (wake, waited) = waiter.join().unwrap();
        assert_eq!(wake, Wake::Raised);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_close_wakes_blocked_waiter() {
        let signal = Arc::new(Signal::new());
        let waiter = {
            let s = Arc::clone(&signal);
            thread::spawn(move || s.wait_timeout(Duration::from_secs(10)))
        };

        thread::sleep(Duration::from_millis(20));
        signal.close();

        assert_eq!(waiter.join().unwrap(), Wake::Closed);
    }
}
