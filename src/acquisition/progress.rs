//! Rate limiting for progress messages.

use std::time::Duration;
use tokio::time::Instant;

/// Decides when the next "Output is at N%" line is due.
///
/// Two independent triggers, either one is enough: a fixed time since the last
/// message, or a large enough move in percentage since the last message. Both
/// share the same bookkeeping so a burst of changes prints once.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    percent_step: f64,
    interval: Option<Duration>,
    last_percent: f64,
    last_at: Instant,
}

impl ProgressThrottle {
    /// A step of zero disables the percentage trigger.
    pub fn new(percent_step: f64, interval: Option<Duration>, now: Instant) -> Self {
        Self {
            percent_step,
            interval,
            last_percent: 100.0,
            last_at: now,
        }
    }

    /// Record that a message was printed.
    pub fn mark(&mut self, percent: f64, now: Instant) {
        self.last_percent = percent;
        self.last_at = now;
    }

    /// Whether a message is due for this reading.
    pub fn is_due(&self, percent: f64, now: Instant) -> bool {
        let time_due = self
            .interval
            .is_some_and(|interval| now.saturating_duration_since(self.last_at) > interval);
        let change_due =
            self.percent_step > 0.0 && (percent - self.last_percent).abs() >= self.percent_step;
        time_due || change_due
    }

    /// Check and, when due, mark in one step.
    pub fn observe(&mut self, percent: f64, now: Instant) -> bool {
        let due = self.is_due(percent, now);
        if due {
            self.mark(percent, now);
        }
        due
    }

    /// Percentage at the last message.
    pub fn last_percent(&self) -> f64 {
        self.last_percent
    }

    /// Time of the last message.
    pub fn last_at(&self) -> Instant {
        self.last_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_trigger() {
        let now = Instant::now();
        let mut throttle = ProgressThrottle::new(5.0, None, now);

        assert!(!throttle.observe(96.0, now));
        assert!(throttle.observe(95.0, now));
        assert_eq!(throttle.last_percent(), 95.0);

        // Measured from the last print, not from 100 %
        assert!(!throttle.observe(91.0, now));
        assert!(throttle.observe(90.0, now));

        // Upward moves count too
        assert!(throttle.observe(96.0, now));
    }

    #[test]
    fn test_time_trigger() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(0.0, Some(Duration::from_secs(60)), start);

        assert!(!throttle.observe(50.0, start + Duration::from_secs(60)));
        assert!(throttle.observe(100.0, start + Duration::from_secs(61)));
        assert_eq!(throttle.last_at(), start + Duration::from_secs(61));
        assert!(!throttle.observe(100.0, start + Duration::from_secs(100)));
    }

    #[test]
    fn test_either_trigger_resets_both() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(5.0, Some(Duration::from_secs(60)), start);

        // Percentage fires first and restarts the timer
        assert!(throttle.observe(94.0, start + Duration::from_secs(30)));
        assert!(!throttle.observe(93.0, start + Duration::from_secs(80)));

        // Timer fires and restarts the percentage reference
        assert!(throttle.observe(92.0, start + Duration::from_secs(91)));
        assert!(!throttle.observe(88.0, start + Duration::from_secs(92)));
    }

    #[test]
    fn test_disabled_never_prints() {
        let start = Instant::now();
        let mut throttle = ProgressThrottle::new(0.0, None, start);
        assert!(!throttle.observe(1.0, start + Duration::from_secs(3600)));
    }
}
