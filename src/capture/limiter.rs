use std::time::Duration;

/// Polled capture-rate gate.
///
/// The host passes a monotonic timestamp on every tick. A capture is allowed when no capture has
/// happened yet, or when at least `interval` has elapsed since the last one. Early ticks are
/// skipped rather than queued, and a late tick never grants more than one capture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureLimiter {
    interval: Duration,
    last: Option<Duration>,
}

impl CaptureLimiter {
    /// A limiter that fires at most once per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Minimum spacing between captures.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Timestamp of the last recorded capture.
    pub fn last_capture(&self) -> Option<Duration> {
        self.last
    }

    /// Change the spacing, keeping the last capture time.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Forget the last capture so the next poll fires immediately.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Whether a capture may happen at `now`.
    ///
    /// Timestamps that go backwards never fire once a capture has been recorded.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now
                .checked_sub(last)
                .is_some_and(|elapsed| elapsed >= self.interval),
        }
    }

    /// Record a capture at `now`.
    pub fn record(&mut self, now: Duration) {
        self.last = Some(now);
    }

    /// Check and record in one step; returns whether the capture fired.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.is_due(now) {
            self.record(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/limiter.rs"]
mod tests;
