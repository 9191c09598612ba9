//! TSL2591 light sensor on an `embedded-hal` I2C bus.
//!
//! Low gain with 100 ms integration. Lux is computed from the full-spectrum and
//! infrared channels with the AMS application-note formula. An overflowing
//! channel reads as the saturation ceiling.

use async_trait::async_trait;
use embedded_hal::blocking::i2c;
use std::fmt::Debug;

use super::{LightSensor, LightSensorModel};
use crate::error::{AppResult, DaqError};

const ADDRESS: u8 = 0x29;
const COMMAND: u8 = 0xA0;

const REG_ENABLE: u8 = 0x00;
const REG_CONTROL: u8 = 0x01;
const REG_DEVICE_ID: u8 = 0x12;
const REG_C0DATAL: u8 = 0x14;

const DEVICE_ID: u8 = 0x50;
const POWER_ON: u8 = 0x01;
const ALS_ENABLE: u8 = 0x02;
/// Low gain (1x), 100 ms integration
const CONTROL_LOW_GAIN_100MS: u8 = 0x00;

const INTEGRATION_MS: f64 = 100.0;
const GAIN: f64 = 1.0;
const LUX_DF: f64 = 408.0;
/// ADC full scale at 100 ms integration
const MAX_COUNT: u16 = 36_863;

/// Lux from raw channel counts, `None` when a channel overflowed.
pub fn lux_from_channels(full: u16, infrared: u16) -> Option<f64> {
    if full >= MAX_COUNT || infrared >= MAX_COUNT {
        return None;
    }
    if full == 0 {
        return Some(0.0);
    }
    let (ch0, ch1) = (f64::from(full), f64::from(infrared));
    let counts_per_lux = (INTEGRATION_MS * GAIN) / LUX_DF;
    let lux = (ch0 - ch1) * (1.0 - ch1 / ch0) / counts_per_lux;
    Some(lux.max(0.0))
}

/// TSL2591 light sensor.
pub struct Tsl2591<I2C> {
    bus: I2C,
}

impl<I2C, E> Tsl2591<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
    E: Debug,
{
    /// Check the device ID, set low gain and power the sensor on.
    pub fn new(bus: I2C) -> AppResult<Self> {
        let mut sensor = Self { bus };

        let mut id = [0u8; 1];
        sensor
            .bus
            .write_read(ADDRESS, &[COMMAND | REG_DEVICE_ID], &mut id)
            .map_err(|e| DaqError::Sensor(format!("TSL2591: Reading device ID failed: {:?}", e)))?;
        if id[0] != DEVICE_ID {
            return Err(DaqError::Sensor(format!(
                "TSL2591: Unexpected device ID {:#04x}",
                id[0]
            )));
        }

        sensor
            .write(REG_CONTROL, CONTROL_LOW_GAIN_100MS)
            .map_err(|e| DaqError::Sensor(format!("TSL2591: Setting gain failed: {:?}", e)))?;
        sensor
            .write(REG_ENABLE, POWER_ON | ALS_ENABLE)
            .map_err(|e| DaqError::Sensor(format!("TSL2591: Enabling failed: {:?}", e)))?;
        Ok(sensor)
    }

    /// Release the I2C bus.
    pub fn destroy(self) -> I2C {
        self.bus
    }

    fn write(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.bus.write(ADDRESS, &[COMMAND | register, value])
    }

    fn read_channels(&mut self) -> Result<(u16, u16), E> {
        let mut raw = [0u8; 4];
        self.bus
            .write_read(ADDRESS, &[COMMAND | REG_C0DATAL], &mut raw)?;
        Ok((
            u16::from_le_bytes([raw[0], raw[1]]),
            u16::from_le_bytes([raw[2], raw[3]]),
        ))
    }
}

#[async_trait]
impl<I2C, E> LightSensor for Tsl2591<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E> + Send,
    E: Debug,
{
    fn name(&self) -> &str {
        "TSL2591"
    }

    fn ceiling(&self) -> f64 {
        LightSensorModel::Tsl2591.ceiling()
    }

    async fn read_lux(&mut self) -> AppResult<f64> {
        let (full, infrared) = self
            .read_channels()
            .map_err(|e| DaqError::Sensor(format!("TSL2591: Reading channels failed: {:?}", e)))?;
        let ceiling = self.ceiling();
        Ok(lux_from_channels(full, infrared).map_or(ceiling, |lux| lux.min(ceiling)))
    }
}
