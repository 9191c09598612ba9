//! The acquisition loop.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::context::RunContext;
use super::phase::Phase;
use super::summary::{EndReason, RunSummary};
use super::{BASELINE_SAMPLES, ONSET_FACTOR, SAMPLING_WINDOW, TERMINATION_GRACE};
use crate::config::RunConfig;
use crate::error::AppResult;
use crate::indicator::{Indicator, IndicatorRole};
use crate::measurement::{Reading, Sample};
use crate::report::{messages, Reporter};
use crate::sensor::{LightSensor, TemperatureSensor};
use crate::storage::RecordSink;

/// Drives one run from baseline to completion.
///
/// Each tick reads the sensors once, acts on the reading according to the
/// current phase, then evaluates transitions using the same reading and the
/// same timestamp. [`Acquisition::run`] sleeps between ticks; tests can call
/// [`Acquisition::tick`] directly.
pub struct Acquisition {
    config: RunConfig,
    light: Box<dyn LightSensor>,
    temperature: Option<Box<dyn TemperatureSensor>>,
    indicator: Box<dyn Indicator>,
    sink: Box<dyn RecordSink>,
    reporter: Box<dyn Reporter>,
    phase: Phase,
    ctx: RunContext,
    started: bool,
    mono_anchor: Instant,
    wall_anchor: DateTime<Utc>,
    samples_written: u64,
    last_elapsed: Duration,
}

impl Acquisition {
    /// Assemble a run. Nothing touches the hardware until the first tick.
    pub fn new(
        config: RunConfig,
        light: Box<dyn LightSensor>,
        indicator: Box<dyn Indicator>,
        sink: Box<dyn RecordSink>,
        reporter: Box<dyn Reporter>,
    ) -> Self {
        let now = Instant::now();
        Self {
            ctx: RunContext::new(&config, now),
            config,
            light,
            temperature: None,
            indicator,
            sink,
            reporter,
            phase: Phase::Baseline,
            started: false,
            mono_anchor: now,
            wall_anchor: Utc::now(),
            samples_written: 0,
            last_elapsed: Duration::ZERO,
        }
    }

    /// Also record temperature on every sample.
    pub fn with_temperature(mut self, sensor: Box<dyn TemperatureSensor>) -> Self {
        self.temperature = Some(sensor);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current run state.
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Rows written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// How long to wait before the next tick, given the current phase.
    pub fn next_delay(&self) -> Duration {
        self.phase.poll_delay(self.config.poll_interval)
    }

    /// Run until a stop condition is met.
    ///
    /// Runs without a maximum duration or termination percentage never return
    /// on their own; cancel the future (e.g., on Ctrl+C) to stop them. Rows
    /// already written are complete.
    ///
    /// # Errors
    ///
    /// The first sensor, indicator or record sink failure aborts the run.
    pub async fn run(mut self) -> AppResult<RunSummary> {
        info!(
            sensor = self.light.name(),
            ceiling = self.light.ceiling(),
            poll_ms = self.config.poll_interval.as_millis() as u64,
            "Starting acquisition"
        );

        let end_reason = loop {
            self.tick().await?;
            if let Some(reason) = self.ctx.end_reason {
                break reason;
            }
            sleep(self.next_delay()).await;
        };

        self.sink.close().await?;

        let summary = RunSummary {
            samples_written: self.samples_written,
            threshold_lux: self.ctx.threshold_lux,
            reference_lux: self.ctx.reference_lux,
            recorded_for: self.last_elapsed,
            end_reason,
            saturated: self.ctx.saturation_warned,
        };
        info!(%summary, "Acquisition finished");
        Ok(summary)
    }

    /// Perform one tick and return the phase it ended in.
    ///
    /// Ticking a finished run does nothing.
    pub async fn tick(&mut self) -> AppResult<Phase> {
        if self.phase == Phase::Done {
            return Ok(Phase::Done);
        }
        if !self.started {
            self.start()?;
        }

        let reading = self.read().await?;
        let now = Instant::now();
        self.check_saturation(reading.lux);

        match self.phase {
            Phase::Baseline => self.on_baseline(reading.lux),
            Phase::AwaitingOnset => self.on_awaiting_onset(reading.lux, now)?,
            Phase::SamplingWindow => self.on_sampling_window(reading, now).await?,
            Phase::MainRecording | Phase::TerminationCheck => {
                self.on_recording(reading, now).await?
            }
            Phase::Done => {}
        }

        if self.phase == Phase::Done {
            self.finish_indicators()?;
        }
        Ok(self.phase)
    }

    fn start(&mut self) -> AppResult<()> {
        self.indicator.set(IndicatorRole::Ready, true)?;
        self.indicator.set(IndicatorRole::Running, false)?;
        self.indicator.set(IndicatorRole::Complete, false)?;
        self.started = true;
        Ok(())
    }

    async fn read(&mut self) -> AppResult<Reading> {
        let lux = self.light.read_lux().await?;
        let temperature = match self.temperature.as_mut() {
            Some(sensor) => Some(sensor.read_celsius().await?),
            None => None,
        };
        Ok(Reading { lux, temperature })
    }

    fn check_saturation(&mut self, lux: f64) {
        let ceiling = self.light.ceiling();
        if lux >= ceiling && !self.ctx.saturation_warned {
            self.ctx.saturation_warned = true;
            warn!(lux, ceiling, "Light sensor saturated");
            self.reporter.warn(&messages::saturated());
        }
    }

    fn on_baseline(&mut self, lux: f64) {
        self.ctx.baseline_sum += lux;
        self.ctx.baseline_count += 1;

        if self.ctx.baseline_count >= BASELINE_SAMPLES {
            self.ctx.threshold_lux = self.ctx.baseline_mean() * ONSET_FACTOR;
            info!(
                baseline = self.ctx.baseline_mean(),
                threshold = self.ctx.threshold_lux,
                "Baseline complete"
            );
            self.reporter.info(&messages::ready());
            self.transition(Phase::AwaitingOnset, lux);
        }
    }

    fn on_awaiting_onset(&mut self, lux: f64, now: Instant) -> AppResult<()> {
        if lux < self.ctx.threshold_lux {
            return self.indicator.toggle(IndicatorRole::Ready);
        }

        self.ctx
            .begin_window(now, SAMPLING_WINDOW, self.config.max_duration);
        self.indicator.set(IndicatorRole::Ready, true)?;
        self.reporter.info(&messages::light_detected());
        self.transition(Phase::SamplingWindow, lux);
        Ok(())
    }

    async fn on_sampling_window(&mut self, reading: Reading, now: Instant) -> AppResult<()> {
        self.record(reading, now).await?;
        self.ctx.track_window(reading.lux);

        if now < self.ctx.window_end {
            return Ok(());
        }

        self.ctx.reference_lux = reading.lux;
        self.ctx.progress.mark(100.0, now);
        self.reporter.info(&messages::sampling_complete(
            self.ctx.reference_lux,
            self.ctx.window_max,
            self.ctx.window_min,
        ));
        self.reporter.info(&messages::stop_conditions(
            self.ctx.reference_lux,
            self.config.max_duration,
            self.config.termination_percentage,
        ));
        self.transition(Phase::MainRecording, reading.lux);

        // The closing reading is the reference itself
        self.check_stop_conditions(100.0, reading.lux, now);
        Ok(())
    }

    async fn on_recording(&mut self, reading: Reading, now: Instant) -> AppResult<()> {
        self.record(reading, now).await?;

        let percent = self.ctx.percent_of_reference(reading.lux);
        if self.ctx.progress.observe(percent, now) {
            self.reporter.info(&messages::progress(percent, reading.lux));
        }

        self.check_stop_conditions(percent, reading.lux, now);
        Ok(())
    }

    fn check_stop_conditions(&mut self, percent: f64, lux: f64, now: Instant) {
        if self.ctx.duration_deadline.is_some_and(|deadline| now >= deadline) {
            self.finish(EndReason::MaxDuration, lux);
            return;
        }
        let Some(target) = self.config.termination_percentage else {
            return;
        };

        match self.phase {
            Phase::MainRecording if percent <= target => {
                self.ctx.grace_deadline = now + TERMINATION_GRACE;
                self.ctx.progress.mark(percent, now);
                self.reporter
                    .info(&messages::termination_armed(percent, lux, target));
                self.transition(Phase::TerminationCheck, lux);
            }
            Phase::TerminationCheck if now > self.ctx.grace_deadline => {
                self.finish(EndReason::OutputDecayed, lux);
            }
            Phase::TerminationCheck if percent > target => {
                self.reporter.info(&messages::continuing());
                self.transition(Phase::MainRecording, lux);
            }
            _ => {}
        }
    }

    async fn record(&mut self, reading: Reading, now: Instant) -> AppResult<()> {
        let elapsed = self.ctx.elapsed(now);
        let sample = Sample {
            timestamp: self.wall_time(now),
            lux: reading.lux,
            temperature: reading.temperature,
            elapsed,
        };
        self.sink.append(&sample).await?;
        self.samples_written += 1;
        self.last_elapsed = elapsed;
        self.indicator.toggle(IndicatorRole::Running)
    }

    fn finish(&mut self, reason: EndReason, lux: f64) {
        self.ctx.end_reason = Some(reason);
        info!(reason = %reason, samples = self.samples_written, "Stop condition met");
        self.reporter.info(&messages::complete());
        self.transition(Phase::Done, lux);
    }

    fn finish_indicators(&mut self) -> AppResult<()> {
        self.indicator.set(IndicatorRole::Complete, true)?;
        self.indicator.set(IndicatorRole::Running, false)?;
        self.indicator.set(IndicatorRole::Ready, false)
    }

    fn transition(&mut self, next: Phase, lux: f64) {
        debug_assert!(
            self.phase.can_transition_to(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        debug!(from = %self.phase, to = %next, lux, "Phase transition");
        self.phase = next;
    }

    fn wall_time(&self, now: Instant) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(now.saturating_duration_since(self.mono_anchor))
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.wall_anchor + offset
    }
}
