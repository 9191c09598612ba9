//! Configuration System
//!
//! Runtime tests are configured through [`Settings`], loaded with Figment.
//!
//! # Configuration Sources
//!
//! Configuration is merged from (lowest to highest precedence):
//! 1. Built-in defaults
//! 2. TOML configuration file (default: `config/lumen_daq.toml`, optional)
//! 3. Environment variables prefixed with `LUMEN_DAQ_`
//! 4. Command-line overrides supplied by the binary
//!
//! A loaded `Settings` is checked by [`Settings::validate`] and turned into the
//! immutable [`RunConfig`] that the acquisition engine runs with.
//!
//! # Environment Variables
//!
//! Sections and keys are separated by a double underscore:
//!
//! ```text
//! LUMEN_DAQ_RUN__POLL_INTERVAL_SECS=0.5
//! LUMEN_DAQ_RUN__TERMINATION_PERCENTAGE=10
//! LUMEN_DAQ_LOGGING__LEVEL=debug
//! ```

pub mod run_config;
pub mod settings;

pub use run_config::RunConfig;
pub use settings::{
    IndicatorBackend, IndicatorSettings, LightBackend, LoggingSettings, OutputSettings,
    RunSettings, SensorSettings, Settings, SimulationSettings, TemperatureBackend,
    TemperatureSettings, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
