//! Runtime test recorder for light sources.
//!
//! Watches a light sensor, waits for the source under test to switch on, records
//! its output to CSV and stops once the output has decayed (or a time limit is
//! reached).
//!
//! - [`acquisition`]: the phase-driven run loop
//! - [`sensor`]: light and temperature capabilities and their backends
//! - [`indicator`]: ready / running / complete status outputs
//! - [`storage`]: record rows and the CSV sink
//! - [`report`]: operator-facing console messages
//! - [`config`]: layered settings and the immutable [`config::RunConfig`]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod indicator;
pub mod logging;
pub mod measurement;
pub mod report;
pub mod sensor;
pub mod storage;
