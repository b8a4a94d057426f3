//! CPU-side fence emulation for backends without a native fence object.
//!
//! The fence is a monotonically increasing 64-bit counter. `signal`
//! advances it; `wait` blocks the calling thread by spinning with a
//! yielding sleep, giving the backend a chance to pump its completion
//! query between polls. Nothing here suspends cooperatively.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub struct CpuFence {
    value: AtomicU64,
}

impl CpuFence {
    pub fn new(initial_value: u64) -> Self {
        Self {
            value: AtomicU64::new(initial_value),
        }
    }

    pub fn completed_value(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advances the counter to `value`. The counter never moves
    /// backwards; signaling a smaller value is a no-op.
    pub fn signal(&self, value: u64) {
        self.value.fetch_max(value, Ordering::AcqRel);
    }

    /// Blocks until the counter reaches `value` or the timeout elapses.
    ///
    /// `poll` runs once per iteration so the caller can drive whatever
    /// native completion mechanism eventually signals the counter (e.g.
    /// polling an event query and flushing the immediate context). When
    /// the counter already holds `value` the call returns without
    /// yielding once.
    pub fn wait(&self, value: u64, timeout: Option<Duration>, mut poll: impl FnMut()) -> bool {
        if self.completed_value() >= value {
            return true;
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            poll();
            if self.completed_value() >= value {
                return true;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return false;
                }
            }
            std::thread::yield_now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_signaled_wait_returns_without_polling() {
        let fence = CpuFence::new(0);
        fence.signal(5);

        let mut polls = 0;
        assert!(fence.wait(5, None, || polls += 1));
        assert_eq!(polls, 0);
    }

    #[test]
    fn counter_is_monotonic() {
        let fence = CpuFence::new(3);
        fence.signal(1);
        assert_eq!(fence.completed_value(), 3);
        fence.signal(7);
        assert_eq!(fence.completed_value(), 7);
    }

    #[test]
    fn wait_times_out_when_never_signaled() {
        let fence = CpuFence::new(0);
        assert!(!fence.wait(1, Some(Duration::from_millis(10)), || {}));
    }

    #[test]
    fn wait_observes_signal_from_poll() {
        let fence = CpuFence::new(0);
        let mut countdown = 3;
        let signaled = fence.wait(2, Some(Duration::from_secs(5)), || {
            countdown -= 1;
            if countdown == 0 {
                fence.signal(2);
            }
        });
        assert!(signaled);
    }

    #[test]
    fn cross_thread_signal_wakes_waiter() {
        let fence = std::sync::Arc::new(CpuFence::new(0));
        let signaler = std::sync::Arc::clone(&fence);
        let handle = std::thread::spawn(move || signaler.signal(10));
        assert!(fence.wait(10, Some(Duration::from_secs(5)), || {}));
        handle.join().unwrap();
    }
}
