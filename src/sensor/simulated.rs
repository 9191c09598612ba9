//! Simulated light source and enclosure thermometer.
//!
//! Provides stand-in devices for running the full acquisition loop without hardware.
//! Both measure time with `tokio::time::Instant`, so they follow a paused test clock.
//!
//! # Lamp model
//!
//! - Ambient level until `switch_on_after_secs`
//! - Then `peak_lux` halving every `half_life_mins`, on top of ambient
//! - Multiplicative uniform noise, clipped to `[0, ceiling]`

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::time::Instant;

use super::{LightSensor, LightSensorModel, TemperatureSensor};
use crate::config::SimulationSettings;
use crate::error::AppResult;

/// Time constant of the enclosure warm-up, in seconds.
const WARM_UP_TAU_SECS: f64 = 600.0;

/// Simulated lamp inside an integrating enclosure.
pub struct SimulatedLamp {
    model: LightSensorModel,
    settings: SimulationSettings,
    started: Instant,
    rng: StdRng,
}

impl SimulatedLamp {
    /// Create a lamp whose clock starts now.
    pub fn new(model: LightSensorModel, settings: SimulationSettings) -> Self {
        Self::with_rng(model, settings, StdRng::from_entropy())
    }

    /// Create a lamp with deterministic noise.
    pub fn with_seed(model: LightSensorModel, settings: SimulationSettings, seed: u64) -> Self {
        Self::with_rng(model, settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(model: LightSensorModel, settings: SimulationSettings, rng: StdRng) -> Self {
        Self {
            model,
            settings,
            started: Instant::now(),
            rng,
        }
    }

    /// Noise-free output at `secs` after start-up.
    pub fn ideal_lux(&self, secs: f64) -> f64 {
        let s = &self.settings;
        if secs < s.switch_on_after_secs {
            return s.ambient_lux;
        }
        let on_for_mins = (secs - s.switch_on_after_secs) / 60.0;
        let decay = if s.half_life_mins > 0.0 {
            0.5_f64.powf(on_for_mins / s.half_life_mins)
        } else {
            1.0
        };
        s.ambient_lux + s.peak_lux * decay
    }
}

#[async_trait]
impl LightSensor for SimulatedLamp {
    fn name(&self) -> &str {
        "Simulated lamp"
    }

    fn ceiling(&self) -> f64 {
        self.model.ceiling()
    }

    async fn read_lux(&mut self) -> AppResult<f64> {
        let secs = self.started.elapsed().as_secs_f64();
        let ideal = self.ideal_lux(secs);
        let noise = self.settings.noise_fraction.abs();
        let factor = if noise > 0.0 {
            1.0 + self.rng.gen_range(-noise..=noise)
        } else {
            1.0
        };
        Ok((ideal * factor).clamp(0.0, self.ceiling()))
    }
}

/// Simulated enclosure thermometer warming towards a plateau.
pub struct SimulatedThermometer {
    ambient_celsius: f64,
    peak_celsius: f64,
    started: Instant,
}

impl SimulatedThermometer {
    /// Create a thermometer whose clock starts now.
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            ambient_celsius: settings.ambient_celsius,
            peak_celsius: settings.peak_celsius,
            started: Instant::now(),
        }
    }
}

#[async_trait]
impl TemperatureSensor for SimulatedThermometer {
    fn name(&self) -> &str {
        "Simulated thermometer"
    }

    async fn read_celsius(&mut self) -> AppResult<f64> {
        let secs = self.started.elapsed().as_secs_f64();
        let rise = 1.0 - (-secs / WARM_UP_TAU_SECS).exp();
        Ok(self.ambient_celsius + (self.peak_celsius - self.ambient_celsius) * rise)
    }
}
