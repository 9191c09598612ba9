//! Outcome of a finished run.

use std::fmt;
use std::time::Duration;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The configured maximum duration since onset was reached
    MaxDuration,
    /// Output stayed at or below the termination percentage for the full grace period
    OutputDecayed,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::MaxDuration => write!(f, "maximum duration reached"),
            EndReason::OutputDecayed => write!(f, "output decayed below target"),
        }
    }
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Rows handed to the record sink
    pub samples_written: u64,
    /// Onset threshold derived from the baseline
    pub threshold_lux: f64,
    /// Illuminance at the close of the sampling window
    pub reference_lux: f64,
    /// Time from onset to the last sample
    pub recorded_for: Duration,
    /// Stop condition that ended the run
    pub end_reason: EndReason,
    /// At least one reading hit the sensor ceiling
    pub saturated: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} samples over {:.1} min ({}); threshold {:.1} lux, reference {:.1} lux",
            self.samples_written,
            self.recorded_for.as_secs_f64() / 60.0,
            self.end_reason,
            self.threshold_lux,
            self.reference_lux
        )?;
        if self.saturated {
            write!(f, ", saturated")?;
        }
        Ok(())
    }
}
