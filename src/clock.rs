//! Millisecond clock
//!
//! A monotonic counter advanced from the SysTick (or any 1 kHz) interrupt.
//! The counter wraps at `u32::MAX`; use [`Clock::elapsed_since`] for every
//! interval computation.
//!
//! ```
//! use usbd_analog_io::Clock;
//!
//! static CLOCK: Clock = Clock::new();
//!
//! // In the timer interrupt:
//! CLOCK.tick();
//!
//! // Elsewhere:
//! let start = CLOCK.now();
//! assert!(CLOCK.elapsed_since(start) < 1_000);
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

/// Process-wide millisecond counter.
///
/// The interrupt handler must be the only caller of [`tick()`](Clock::tick).
pub struct Clock {
    millis: AtomicU32,
}

impl Clock {
    /// A clock reading zero.
    pub const fn new() -> Self {
        Self {
            millis: AtomicU32::new(0),
        }
    }

    /// Advance the clock by one millisecond.
    ///
    /// Call this from the timer interrupt, and nowhere else.
    pub fn tick(&self) {
        // Single writer. Load and store keeps this usable on cores
        // without atomic read-modify-write.
        let now = self.millis.load(Ordering::Relaxed);
        self.millis.store(now.wrapping_add(1), Ordering::Release);
    }

    /// Returns the current time, in milliseconds since start.
    pub fn now(&self) -> u32 {
        self.millis.load(Ordering::Acquire)
    }

    /// Milliseconds elapsed since `then`, across wraparound.
    pub fn elapsed_since(&self, then: u32) -> u32 {
        elapsed(then, self.now())
    }

    /// Spin for `ms` milliseconds, calling `poll` on every iteration.
    ///
    /// Pass the USB poll here so that the device keeps servicing the bus
    /// during the delay. The timer interrupt must be running, or this never
    /// returns.
    pub fn sleep_ms(&self, ms: u32, mut poll: impl FnMut()) {
        let start = self.now();
        while self.elapsed_since(start) < ms {
            poll();
        }
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrapping difference `now - then`.
pub fn elapsed(then: u32, now: u32) -> u32 {
    now.wrapping_sub(then)
}

#[cfg(test)]
mod tests {
    use super::{elapsed, Clock};

    #[test]
    fn starts_at_zero() {
        let clock = Clock::new();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn tick_advances_by_one() {
        let clock = Clock::new();
        for _ in 0..10 {
            clock.tick();
        }
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.elapsed_since(4), 6);
    }

    #[test]
    fn elapsed_across_wraparound() {
        assert_eq!(elapsed(u32::MAX - 1, 3), 5);
        assert_eq!(elapsed(u32::MAX, 0), 1);
        assert_eq!(elapsed(7, 7), 0);
    }

    #[test]
    fn tick_wraps() {
        let clock = Clock::new();
        clock.millis.store(u32::MAX, core::sync::atomic::Ordering::Relaxed);
        clock.tick();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.elapsed_since(u32::MAX), 1);
    }

    #[test]
    fn sleep_polls_until_elapsed() {
        let clock = Clock::new();
        let mut polls = 0;
        // Stand in for the interrupt: every poll advances time.
        clock.sleep_ms(25, || {
            polls += 1;
            clock.tick();
        });
        assert_eq!(polls, 25);
        assert_eq!(clock.now(), 25);
    }

    #[test]
    fn zero_sleep_never_polls() {
        let clock = Clock::new();
        let mut polls = 0;
        clock.sleep_ms(0, || polls += 1);
        assert_eq!(polls, 0);
    }
}
