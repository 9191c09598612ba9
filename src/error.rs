//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the whole crate.
//! Using the `thiserror` crate, it provides a single place where every failure a
//! runtime test can hit is named, from configuration problems to a light sensor
//! that stops answering mid-run.
//!
//! ## Error Hierarchy
//!
//! - **`Config`**: Wraps errors from `figment`, typically a TOML file that does not parse
//!   or an environment override with the wrong type.
//! - **`Configuration`**: Semantic errors in a configuration that parsed fine, such as a
//!   negative poll interval or a missing lux-to-lumen factor when lumens are required.
//!   These are caught by `Settings::validate` before any device is opened.
//! - **`Io`** / **`Csv`**: Failures writing the record file.
//! - **`Sensor`**: A read from the light or temperature sensor failed. This is fatal for a
//!   run; the acquisition loop aborts without marking the test complete.
//! - **`Indicator`**: The status outputs could not be driven.
//! - **`FeatureNotEnabled`**: A backend was selected that was compiled out.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Every error the acquisition library can produce.
#[derive(Error, Debug)]
pub enum DaqError {
    /// The configuration sources could not be loaded or merged.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// The configuration loaded but contains invalid values.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record file could not be written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A sensor read failed.
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// A status output could not be set.
    #[error("Indicator error: {0}")]
    Indicator(String),

    /// The requested backend is not part of this build.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DaqError::Sensor("i2c bus timeout".to_string());
        assert_eq!(err.to_string(), "Sensor error: i2c bus timeout");
    }

    #[test]
    fn test_feature_not_enabled_names_flag() {
        let err = DaqError::FeatureNotEnabled("instrument_serial".into());
        assert!(err.to_string().contains("--features instrument_serial"));
    }
}
