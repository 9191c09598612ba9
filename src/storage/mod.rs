//! Persisted run records.
//!
//! One run produces one flat table. Every row holds:
//!
//! | Column | Content |
//! |---|---|
//! | `Time` | Unix timestamp in seconds |
//! | `Lux` | raw illuminance |
//! | `[relative time]` | seconds since light onset (empty unless relative time is on) |
//! | `Duration` | the same, as a fraction of a day (empty unless relative time is on) |
//! | `Lumens` | lux divided by the enclosure factor (empty without a factor) |
//! | `Temperature (C)` | empty without a temperature sensor |

use async_trait::async_trait;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::AppResult;
use crate::measurement::Sample;

pub mod csv_sink;
pub mod path;

pub use csv_sink::CsvRecordSink;
pub use path::{default_output_path, resolve_output_path};

/// Column names, in file order.
pub const HEADER: [&str; 6] = [
    "Time",
    "Lux",
    "[relative time]",
    "Duration",
    "Lumens",
    "Temperature (C)",
];

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Append-only destination for recorded samples.
#[async_trait]
pub trait RecordSink: Send {
    /// Persist one sample. Rows must be complete once this returns.
    async fn append(&mut self, sample: &Sample) -> AppResult<()>;

    /// Flush and release the destination.
    async fn close(&mut self) -> AppResult<()> {
        Ok(())
    }
}

/// Which optional columns get filled.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RowFormat {
    /// Fill `[relative time]` and `Duration`
    pub relative_time: bool,
    /// Divisor for the `Lumens` column
    pub lux_to_lumen_factor: Option<f64>,
}

impl From<&RunConfig> for RowFormat {
    fn from(config: &RunConfig) -> Self {
        Self {
            relative_time: config.relative_time,
            lux_to_lumen_factor: config.lux_to_lumen_factor,
        }
    }
}

/// One row of the record file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordRow {
    /// Unix timestamp in seconds
    #[serde(rename = "Time")]
    pub time: f64,
    /// Raw illuminance
    #[serde(rename = "Lux")]
    pub lux: f64,
    /// Seconds since onset
    #[serde(rename = "[relative time]")]
    pub relative_secs: Option<f64>,
    /// Days since onset
    #[serde(rename = "Duration")]
    pub duration_days: Option<f64>,
    /// Derived output
    #[serde(rename = "Lumens")]
    pub lumens: Option<f64>,
    /// Temperature in °C
    #[serde(rename = "Temperature (C)")]
    pub temperature: Option<f64>,
}

impl RecordRow {
    /// Derive a row from a sample.
    pub fn new(sample: &Sample, format: &RowFormat) -> Self {
        let relative_secs = format
            .relative_time
            .then(|| sample.elapsed.as_secs_f64());

        Self {
            time: sample.timestamp.timestamp_micros() as f64 / 1_000_000.0,
            lux: sample.lux,
            relative_secs,
            duration_days: relative_secs.map(|secs| secs / SECONDS_PER_DAY),
            lumens: format.lux_to_lumen_factor.map(|factor| sample.lux / factor),
            temperature: sample.temperature,
        }
    }
}
