//! Leading + trailing throttle
//!
//! The first value in a quiet period goes out immediately. Values offered
//! inside the interval replace each other, and the newest one goes out once
//! the interval has passed.

/// Coalesces bursts of values to at most one per interval
#[derive(Clone, Debug)]
pub struct TrailingThrottle<T> {
    interval_ms: u64,
    last_sent: Option<u64>,
    pending: Option<T>,
}

impl<T> TrailingThrottle<T> {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_sent: None,
            pending: None,
        }
    }

    fn ready(&self, now: u64) -> bool {
        self.last_sent
            .map_or(true, |at| now.saturating_sub(at) >= self.interval_ms)
    }

    /// Offer a value. Returns it back when it may be sent right away.
    pub fn offer(&mut self, value: T, now: u64) -> Option<T> {
        if self.ready(now) {
            self.last_sent = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// The trailing value, once its interval has passed
    pub fn poll(&mut self, now: u64) -> Option<T> {
        if self.pending.is_some() && self.ready(now) {
            self.last_sent = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Discard the trailing value
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the trailing value becomes due
    pub fn next_due(&self) -> Option<u64> {
        match (&self.pending, self.last_sent) {
            (Some(_), Some(at)) => Some(at + self.interval_ms),
            (Some(_), None) => Some(0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_value_passes() {
        let mut throttle = TrailingThrottle::new(300);
        assert_eq!(throttle.offer(1, 1000), Some(1));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_burst_keeps_only_newest() {
        let mut throttle = TrailingThrottle::new(300);
        throttle.offer(1, 1000);
        assert_eq!(throttle.offer(2, 1100), None);
        assert_eq!(throttle.offer(3, 1200), None);
        assert_eq!(throttle.next_due(), Some(1300));

        assert_eq!(throttle.poll(1299), None);
        assert_eq!(throttle.poll(1300), Some(3));
        assert_eq!(throttle.poll(2000), None);
    }

    #[test]
    fn test_trailing_send_restarts_interval() {
        let mut throttle = TrailingThrottle::new(300);
        throttle.offer(1, 0);
        throttle.offer(2, 100);
        assert_eq!(throttle.poll(300), Some(2));
        assert_eq!(throttle.offer(3, 400), None);
        assert_eq!(throttle.poll(600), Some(3));
    }

    #[test]
    fn test_cancel_discards_trailing() {
        let mut throttle = TrailingThrottle::new(300);
        throttle.offer(1, 0);
        throttle.offer(2, 10);
        assert_eq!(throttle.cancel(), Some(2));
        assert_eq!(throttle.poll(1000), None);
    }
}
