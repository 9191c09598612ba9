//! Operator-facing progress messages.
//!
//! The acquisition engine talks to the person at the bench through a [`Reporter`].
//! [`ConsoleReporter`] prints each message to stdout behind a local `HH:MM:SS `
//! prefix. The message texts live in [`messages`] so every reporter says the same
//! thing.

use chrono::Local;
use tracing::debug;

/// Sink for human-readable progress messages.
pub trait Reporter: Send {
    /// Normal progress message.
    fn info(&mut self, message: &str);

    /// Recoverable problem the operator should know about.
    fn warn(&mut self, message: &str);
}

/// Prints timestamped messages to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    /// Create a console reporter.
    pub fn new() -> Self {
        Self
    }
}

/// Local wall-clock prefix used on every console line.
pub fn timestamp_prefix() -> String {
    Local::now().format("%H:%M:%S ").to_string()
}

impl Reporter for ConsoleReporter {
    fn info(&mut self, message: &str) {
        println!("{}{}", timestamp_prefix(), message);
        debug!(target: "lumen_daq::report", "{}", message);
    }

    fn warn(&mut self, message: &str) {
        println!("{}{}", timestamp_prefix(), message);
        debug!(target: "lumen_daq::report", warning = true, "{}", message);
    }
}

/// Message texts.
pub mod messages {
    use std::path::Path;
    use std::time::Duration;

    /// Requested record file is taken.
    pub fn file_exists(path: &Path) -> String {
        format!(
            "{} already exists. Picking another name to avoid overwriting it.",
            path.display()
        )
    }

    /// Where the record goes.
    pub fn saving_as(path: &Path) -> String {
        format!("Saving as {}", path.display())
    }

    /// Baseline done, waiting for the light.
    pub fn ready() -> String {
        "Ready to start the test. Turn on the light now.".to_string()
    }

    /// Onset detected.
    pub fn light_detected() -> String {
        "Light detected. Recording started.".to_string()
    }

    /// First reading at the saturation ceiling.
    pub fn saturated() -> String {
        "Sensor is saturated. The light is too bright to measure with your current setup. \
         Consider adding a filter between the source and the sensor. The test will continue, \
         but will be cut off at the high end."
            .to_string()
    }

    /// End of the 30 s sampling window.
    pub fn sampling_complete(reference_lux: f64, window_max: f64, window_min: f64) -> String {
        format!(
            "Sampling period complete. The output at 30s was {:.1} lux. \
             Sampling period max = {:.1} lux, min = {:.1} lux.",
            reference_lux, window_max, window_min
        )
    }

    /// Which conditions will end the run.
    pub fn stop_conditions(
        reference_lux: f64,
        max_duration: Option<Duration>,
        termination_percentage: Option<f64>,
    ) -> String {
        let mut text = String::from("\tThe test will run until you stop it");
        if let Some(duration) = max_duration {
            text.push_str(&format!(
                ", or it has recorded for {:.0} minutes",
                duration.as_secs_f64() / 60.0
            ));
        }
        if let Some(percentage) = termination_percentage {
            text.push_str(&format!(
                ", or it reaches {:.1} lux ({:.1}% of the output at 30s)",
                reference_lux * percentage / 100.0,
                percentage
            ));
        }
        text.push('.');
        text
    }

    /// Periodic progress line.
    pub fn progress(percent: f64, lux: f64) -> String {
        format!("Output is at {:.0}% ({:.0} lux)", percent, lux)
    }

    /// Output dropped to the termination level.
    pub fn termination_armed(percent: f64, lux: f64, termination_percentage: f64) -> String {
        format!(
            "Output has reached {:.0}% ({:.0} lux), which is at or below your {}% target. \
             The test will stop if output doesn't increase within 5 minutes.",
            percent, lux, termination_percentage
        )
    }

    /// Output recovered during the grace period.
    pub fn continuing() -> String {
        "Output increased. Continuing to record.".to_string()
    }

    /// Run finished.
    pub fn complete() -> String {
        "Test complete".to_string()
    }
}
