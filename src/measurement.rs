//! Sensor readings and recorded samples.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// One poll of the sensors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Illuminance in raw sensor units (lux)
    pub lux: f64,
    /// Temperature in °C, when a temperature sensor is configured
    pub temperature: Option<f64>,
}

/// A single recorded observation.
///
/// Samples are created once per tick from the sampling window onward and handed
/// straight to the record sink.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// UTC timestamp of the reading
    pub timestamp: DateTime<Utc>,
    /// Illuminance in raw sensor units (lux)
    pub lux: f64,
    /// Temperature in °C
    pub temperature: Option<f64>,
    /// Time since light onset
    pub elapsed: Duration,
}
