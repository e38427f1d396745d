#![forbid(unsafe_code)]

//! Monotonic clock capability.
//!
//! Debounce and scheduling compare durations read from a [`Clock`]. Hosts
//! that own time explicitly (tests, the step runner) use
//! [`DeterministicClock`]; live hosts use [`MonotonicClock`].

use core::time::Duration;

/// Source of monotonic time, measured from an arbitrary origin.
pub trait Clock {
    /// Current monotonic time.
    fn now_mono(&self) -> Duration;
}

/// Deterministic monotonic clock controlled by the host.
#[derive(Debug, Default, Clone)]
pub struct DeterministicClock {
    now: Duration,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    /// Set current monotonic time.
    pub fn set(&mut self, now: Duration) {
        self.now = now;
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now
    }
}

/// Wall-free monotonic clock backed by `web_time::Instant`, which maps to
/// `performance.now()` on wasm32 and `std::time::Instant` elsewhere.
///
/// For embedders that drive a `Proctor` from real browser callbacks instead
/// of the step host, which owns a [`DeterministicClock`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: web_time::Instant,
}

impl MonotonicClock {
    /// Create a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: web_time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_mono(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_mono(&self) -> Duration {
        (**self).now_mono()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_clock_advances_monotonically() {
        let mut c = DeterministicClock::new();
        assert_eq!(c.now_mono(), Duration::ZERO);

        c.advance(Duration::from_millis(10));
        assert_eq!(c.now_mono(), Duration::from_millis(10));

        c.advance(Duration::from_millis(5));
        assert_eq!(c.now_mono(), Duration::from_millis(15));

        // Saturation: don't panic or wrap.
        c.set(Duration::MAX);
        c.advance(Duration::from_secs(1));
        assert_eq!(c.now_mono(), Duration::MAX);
    }

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let c = MonotonicClock::new();
        let a = c.now_mono();
        let b = c.now_mono();
        assert!(b >= a);
    }
}
