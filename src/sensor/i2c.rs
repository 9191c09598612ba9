//! Sensors on a Linux I2C bus (`/dev/i2c-N`).
//!
//! Each sensor opens its own handle to the bus device, so the light and
//! temperature chips can share one physical bus.

use std::path::Path;

use super::{LightSensor, LightSensorModel, TemperatureSensor};
use crate::error::{AppResult, DaqError};

/// Temperature chips supported on the I2C bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermometerChip {
    /// MCP9808 ambient sensor
    Mcp9808,
    /// MCP9600 thermocouple amplifier
    Mcp9600,
}

#[cfg(feature = "instrument_linux")]
mod i2c_enabled {
    use super::*;
    use crate::sensor::{mcp9600, mcp9808, Mcp9600, Mcp9808, Tsl2591, Veml7700};
    use linux_embedded_hal::I2cdev;
    use tracing::debug;

    fn open_bus(path: &Path) -> AppResult<I2cdev> {
        I2cdev::new(path).map_err(|e| {
            DaqError::Sensor(format!(
                "Failed to open I2C bus '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Open the light sensor chip `model` on the bus at `path`.
    pub fn open_light_sensor(
        model: LightSensorModel,
        path: &Path,
    ) -> AppResult<Box<dyn LightSensor>> {
        let bus = open_bus(path)?;
        let sensor: Box<dyn LightSensor> = match model {
            LightSensorModel::Tsl2591 => Box::new(Tsl2591::new(bus)?),
            LightSensorModel::Veml7700 => Box::new(Veml7700::new(bus)?),
        };
        debug!(%model, bus = %path.display(), "I2C light sensor ready");
        Ok(sensor)
    }

    /// Open the temperature chip on the bus at `path`, at its default address.
    pub fn open_thermometer(
        chip: ThermometerChip,
        path: &Path,
    ) -> AppResult<Box<dyn TemperatureSensor>> {
        let bus = open_bus(path)?;
        let sensor: Box<dyn TemperatureSensor> = match chip {
            ThermometerChip::Mcp9808 => Box::new(Mcp9808::new(bus, mcp9808::DEFAULT_ADDRESS)?),
            ThermometerChip::Mcp9600 => Box::new(Mcp9600::new(bus, mcp9600::DEFAULT_ADDRESS)?),
        };
        debug!(?chip, bus = %path.display(), "I2C thermometer ready");
        Ok(sensor)
    }
}

#[cfg(not(feature = "instrument_linux"))]
mod i2c_disabled {
    use super::*;

    /// Always fails: Linux I2C support is not part of this build.
    pub fn open_light_sensor(
        _model: LightSensorModel,
        _path: &Path,
    ) -> AppResult<Box<dyn LightSensor>> {
        Err(DaqError::FeatureNotEnabled("instrument_linux".to_string()))
    }

    /// Always fails: Linux I2C support is not part of this build.
    pub fn open_thermometer(
        _chip: ThermometerChip,
        _path: &Path,
    ) -> AppResult<Box<dyn TemperatureSensor>> {
        Err(DaqError::FeatureNotEnabled("instrument_linux".to_string()))
    }
}

#[cfg(feature = "instrument_linux")]
pub use i2c_enabled::{open_light_sensor, open_thermometer};

#[cfg(not(feature = "instrument_linux"))]
pub use i2c_disabled::{open_light_sensor, open_thermometer};
