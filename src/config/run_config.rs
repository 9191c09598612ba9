//! Immutable per-run configuration.

use std::time::Duration;

use crate::config::Settings;
use crate::error::{AppResult, DaqError};

/// Everything the acquisition engine needs to know about a run.
///
/// Built from validated [`Settings`]; unlike `Settings` all intervals are
/// `Duration`s and nothing changes once the run has started.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Delay between ticks while recording.
    pub poll_interval: Duration,
    /// Stop once this much time has passed since light onset.
    pub max_duration: Option<Duration>,
    /// Output percentage (relative to the reference level) that arms termination.
    pub termination_percentage: Option<f64>,
    /// Percentage-point change that triggers a progress message. Zero disables.
    pub print_percentage: f64,
    /// Time between progress messages.
    pub print_interval: Option<Duration>,
    /// Divisor for the lumens column.
    pub lux_to_lumen_factor: Option<f64>,
    /// Fill the relative time and duration columns.
    pub relative_time: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_duration: None,
            termination_percentage: None,
            print_percentage: 5.0,
            print_interval: None,
            lux_to_lumen_factor: None,
            relative_time: false,
        }
    }
}

impl TryFrom<&Settings> for RunConfig {
    type Error = DaqError;

    fn try_from(settings: &Settings) -> Result<Self, Self::Error> {
        settings.validate()?;
        let run = &settings.run;

        Ok(RunConfig {
            poll_interval: seconds(run.poll_interval_secs, "poll_interval_secs")?,
            max_duration: run
                .max_duration_mins
                .map(|m| seconds(m * 60.0, "max_duration_mins"))
                .transpose()?,
            termination_percentage: run.termination_percentage,
            print_percentage: run.print_percentage,
            print_interval: run
                .print_interval_mins
                .map(|m| seconds(m * 60.0, "print_interval_mins"))
                .transpose()?,
            lux_to_lumen_factor: settings.output.lux_to_lumen_factor,
            relative_time: run.relative_time,
        })
    }
}

fn seconds(value: f64, name: &str) -> AppResult<Duration> {
    Duration::try_from_secs_f64(value)
        .map_err(|e| DaqError::Configuration(format!("{name} is out of range: {e}")))
}
