//! Shared fakes for acquisition integration tests.
//!
//! Every fake hands out a cloneable handle so a test can inspect what the
//! engine did after `Acquisition::run` has consumed the boxed collaborator.

#![allow(dead_code)] // Not every test file uses every fake

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use lumen_daq::acquisition::Acquisition;
use lumen_daq::config::RunConfig;
use lumen_daq::error::{AppResult, DaqError};
use lumen_daq::indicator::{Indicator, IndicatorRole, VirtualIndicator};
use lumen_daq::measurement::Sample;
use lumen_daq::report::Reporter;
use lumen_daq::sensor::LightSensor;
use lumen_daq::storage::RecordSink;

/// Light sensor whose reading is a function of time since it was created.
pub struct ProfileSensor {
    created: Instant,
    ceiling: f64,
    profile: Box<dyn Fn(f64) -> f64 + Send>,
}

impl ProfileSensor {
    /// `profile` maps seconds since creation to lux.
    pub fn new(profile: impl Fn(f64) -> f64 + Send + 'static) -> Self {
        Self {
            created: Instant::now(),
            ceiling: 88_000.0,
            profile: Box::new(profile),
        }
    }

    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling;
        self
    }
}

#[async_trait]
impl LightSensor for ProfileSensor {
    fn name(&self) -> &str {
        "profile"
    }

    fn ceiling(&self) -> f64 {
        self.ceiling
    }

    async fn read_lux(&mut self) -> AppResult<f64> {
        let secs = self.created.elapsed().as_secs_f64();
        Ok((self.profile)(secs).min(self.ceiling))
    }
}

/// Light sensor that answers `ok_reads` times, then fails.
pub struct FailingSensor {
    pub lux: f64,
    pub ok_reads: usize,
}

#[async_trait]
impl LightSensor for FailingSensor {
    fn name(&self) -> &str {
        "failing"
    }

    fn ceiling(&self) -> f64 {
        88_000.0
    }

    async fn read_lux(&mut self) -> AppResult<f64> {
        if self.ok_reads == 0 {
            return Err(DaqError::Sensor("bus timeout".to_string()));
        }
        self.ok_reads -= 1;
        Ok(self.lux)
    }
}

/// Record sink keeping samples in memory.
#[derive(Clone, Default)]
pub struct MemorySink {
    samples: Arc<Mutex<Vec<Sample>>>,
    closed: Arc<Mutex<bool>>,
}

impl MemorySink {
    pub fn samples(&self) -> Vec<Sample> {
        self.samples.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&mut self, sample: &Sample) -> AppResult<()> {
        self.samples.lock().unwrap().push(sample.clone());
        Ok(())
    }

    async fn close(&mut self) -> AppResult<()> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Indicator bank shared with the test.
#[derive(Clone, Default)]
pub struct SharedIndicator {
    inner: Arc<Mutex<VirtualIndicator>>,
}

impl Indicator for SharedIndicator {
    fn set(&mut self, role: IndicatorRole, on: bool) -> AppResult<()> {
        self.inner.lock().unwrap().set(role, on)
    }

    fn is_on(&self, role: IndicatorRole) -> bool {
        self.inner.lock().unwrap().is_on(role)
    }
}

/// Reporter collecting every message.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }
}

impl Reporter for RecordingReporter {
    fn info(&mut self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn warn(&mut self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }
}

/// Handles to everything the engine was given.
#[derive(Clone, Default)]
pub struct Bench {
    pub sink: MemorySink,
    pub indicator: SharedIndicator,
    pub reporter: RecordingReporter,
}

impl Bench {
    pub fn acquisition(&self, config: RunConfig, light: impl LightSensor + 'static) -> Acquisition {
        Acquisition::new(
            config,
            Box::new(light),
            Box::new(self.indicator.clone()),
            Box::new(self.sink.clone()),
            Box::new(self.reporter.clone()),
        )
    }
}

/// Ambient 10 lux, switched on to `on_lux` at t = 3 s.
pub fn lamp_on_at_3s(on_lux: impl Fn(f64) -> f64 + Send + 'static) -> ProfileSensor {
    ProfileSensor::new(move |t| if t < 3.0 { 10.0 } else { on_lux(t) })
}

/// One-second recording interval so pre-recording ticks run at 0.5 s.
pub fn config() -> RunConfig {
    RunConfig {
        poll_interval: Duration::from_secs(1),
        ..RunConfig::default()
    }
}

/// Assert `actual` is within `tolerance` seconds of `expected`.
pub fn assert_secs_near(actual: Duration, expected: f64, tolerance: f64, context: &str) {
    let actual = actual.as_secs_f64();
    assert!(
        (actual - expected).abs() <= tolerance,
        "{context}: expected {expected}s ± {tolerance}s, got {actual}s"
    );
}
