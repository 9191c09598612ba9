//! Sensor capability traits and backends.
//!
//! The acquisition engine only ever sees two capabilities:
//!
//! - [`LightSensor`]: instantaneous illuminance, clipped at a known saturation ceiling
//! - [`TemperatureSensor`]: instantaneous temperature in °C
//!
//! Backends:
//!
//! - [`simulated`]: lamp and enclosure models for dry runs and demos
//! - [`serial`]: probes answering `READ` queries over a serial port
//! - [`veml7700`], [`tsl2591`]: light sensor chips on any `embedded-hal` I2C bus
//! - [`mcp9808`], [`mcp9600`]: temperature chips on any `embedded-hal` I2C bus
//! - [`i2c`]: the chips above on a Linux `/dev/i2c-N` bus

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppResult;

pub mod i2c;
pub mod mcp9600;
pub mod mcp9808;
pub mod serial;
pub mod simulated;
pub mod tsl2591;
pub mod veml7700;

pub use i2c::ThermometerChip;
pub use mcp9600::Mcp9600;
pub use mcp9808::Mcp9808;
pub use serial::SerialProbe;
pub use simulated::{SimulatedLamp, SimulatedThermometer};
pub use tsl2591::Tsl2591;
pub use veml7700::Veml7700;

/// Capability for devices that measure illuminance.
#[async_trait]
pub trait LightSensor: Send {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Highest value the sensor can report; readings at this level are saturated.
    fn ceiling(&self) -> f64;

    /// Read the current illuminance in lux.
    async fn read_lux(&mut self) -> AppResult<f64>;
}

/// Capability for devices that measure temperature.
#[async_trait]
pub trait TemperatureSensor: Send {
    /// Human-readable device name for logs.
    fn name(&self) -> &str;

    /// Read the current temperature in °C.
    async fn read_celsius(&mut self) -> AppResult<f64>;
}

/// Supported light sensor chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LightSensorModel {
    /// AMS TSL2591, low gain
    Tsl2591,
    /// Vishay VEML7700, gain 1/8 with 100 ms integration
    Veml7700,
}

impl LightSensorModel {
    /// Saturation ceiling in lux for the gain settings used by this crate.
    pub fn ceiling(self) -> f64 {
        match self {
            LightSensorModel::Tsl2591 => 88_000.0,
            LightSensorModel::Veml7700 => 120_000.0,
        }
    }
}

impl fmt::Display for LightSensorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightSensorModel::Tsl2591 => write!(f, "TSL2591"),
            LightSensorModel::Veml7700 => write!(f, "VEML7700"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ceilings() {
        assert_eq!(LightSensorModel::Tsl2591.ceiling(), 88_000.0);
        assert_eq!(LightSensorModel::Veml7700.ceiling(), 120_000.0);
        assert_eq!(LightSensorModel::Veml7700.to_string(), "VEML7700");
    }
}
