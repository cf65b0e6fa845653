//! Conversion of host frame timestamps into simulation deltas.

use std::time::Duration;

/// Turns monotonic host timestamps into clamped simulation deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    last_ms: Option<f64>,
    cap: Duration,
}

impl FrameClock {
    /// Creates a clock that never reports a delta larger than `cap`.
    #[must_use]
    pub const fn new(cap: Duration) -> Self {
        Self { last_ms: None, cap }
    }

    /// Records the timestamp and returns the time elapsed since the previous
    /// one, clamped to the cap.
    ///
    /// The first frame yields zero, as do non-finite timestamps and timestamps
    /// earlier than the previous one.
    pub fn advance(&mut self, now_ms: f64) -> Duration {
        if !now_ms.is_finite() {
            return Duration::ZERO;
        }

        let Some(previous) = self.last_ms.replace(now_ms) else {
            return Duration::ZERO;
        };

        let elapsed_ms = now_ms - previous;
        if elapsed_ms <= 0.0 {
            return Duration::ZERO;
        }
        if elapsed_ms >= self.cap.as_secs_f64() * 1000.0 {
            return self.cap;
        }

        // Whole microseconds keep repeated frames free of float drift.
        Duration::from_micros((elapsed_ms * 1000.0).round() as u64)
    }
}
