//! Mutable per-run state.

use std::time::Duration;
use tokio::time::Instant;

use super::progress::ProgressThrottle;
use super::summary::EndReason;
use crate::config::RunConfig;

/// Bookkeeping carried from tick to tick.
///
/// Every field exists from the start of the run. Values that are only known
/// later (threshold, reference level, deadlines) start out as sentinels that
/// cannot trigger anything.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Sum of baseline readings so far
    pub baseline_sum: f64,
    /// Number of baseline readings so far
    pub baseline_count: u32,
    /// Onset threshold in lux. Infinite until the baseline is complete.
    pub threshold_lux: f64,
    /// Light onset. Run start until onset is detected.
    pub test_start: Instant,
    /// Close of the sampling window
    pub window_end: Instant,
    /// Lowest reading inside the sampling window
    pub window_min: f64,
    /// Highest reading inside the sampling window
    pub window_max: f64,
    /// Illuminance at window close; percentages are relative to this. Zero until then.
    pub reference_lux: f64,
    /// Progress message throttling
    pub progress: ProgressThrottle,
    /// End of the termination grace period
    pub grace_deadline: Instant,
    /// Onset plus the maximum duration, if one is configured
    pub duration_deadline: Option<Instant>,
    /// Saturation already reported
    pub saturation_warned: bool,
    /// Set exactly once, when the run enters `Done`
    pub end_reason: Option<EndReason>,
}

impl RunContext {
    /// Fresh context for a run starting at `now`.
    pub fn new(config: &RunConfig, now: Instant) -> Self {
        Self {
            baseline_sum: 0.0,
            baseline_count: 0,
            threshold_lux: f64::INFINITY,
            test_start: now,
            window_end: now,
            window_min: f64::INFINITY,
            window_max: f64::NEG_INFINITY,
            reference_lux: 0.0,
            progress: ProgressThrottle::new(config.print_percentage, config.print_interval, now),
            grace_deadline: now,
            duration_deadline: None,
            saturation_warned: false,
            end_reason: None,
        }
    }

    /// Mean of the baseline readings collected so far.
    pub fn baseline_mean(&self) -> f64 {
        if self.baseline_count == 0 {
            0.0
        } else {
            self.baseline_sum / f64::from(self.baseline_count)
        }
    }

    /// Start the sampling window at onset.
    pub fn begin_window(&mut self, now: Instant, window: Duration, max_duration: Option<Duration>) {
        self.test_start = now;
        self.window_end = now + window;
        self.window_min = f64::INFINITY;
        self.window_max = f64::NEG_INFINITY;
        self.duration_deadline = max_duration.map(|d| now + d);
    }

    /// Include a reading in the window extremes.
    pub fn track_window(&mut self, lux: f64) {
        self.window_min = self.window_min.min(lux);
        self.window_max = self.window_max.max(lux);
    }

    /// Output as a percentage of the reference level.
    ///
    /// A zero reference (light reading nothing at window close) has no
    /// meaningful ratio and is reported as 100 %.
    pub fn percent_of_reference(&self, lux: f64) -> f64 {
        if self.reference_lux > 0.0 {
            lux / self.reference_lux * 100.0
        } else {
            100.0
        }
    }

    /// Time since onset.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.test_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_cannot_trigger() {
        let now = Instant::now();
        let ctx = RunContext::new(&RunConfig::default(), now);

        assert!(1.0e12 < ctx.threshold_lux);
        assert_eq!(ctx.baseline_mean(), 0.0);
        assert_eq!(ctx.duration_deadline, None);
        assert_eq!(ctx.end_reason, None);
    }

    #[test]
    fn test_window_tracking() {
        let now = Instant::now();
        let mut ctx = RunContext::new(&RunConfig::default(), now);
        ctx.begin_window(now, Duration::from_secs(30), Some(Duration::from_secs(600)));

        for lux in [950.0, 1010.0, 980.0] {
            ctx.track_window(lux);
        }
        assert_eq!(ctx.window_min, 950.0);
        assert_eq!(ctx.window_max, 1010.0);
        assert_eq!(ctx.window_end, now + Duration::from_secs(30));
        assert_eq!(ctx.duration_deadline, Some(now + Duration::from_secs(600)));
    }

    #[test]
    fn test_percent_of_reference() {
        let now = Instant::now();
        let mut ctx = RunContext::new(&RunConfig::default(), now);
        assert_eq!(ctx.percent_of_reference(5.0), 100.0);

        ctx.reference_lux = 800.0;
        assert_eq!(ctx.percent_of_reference(400.0), 50.0);
    }
}
