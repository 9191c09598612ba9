//! MCP9600 thermocouple amplifier on an `embedded-hal` I2C bus.
//!
//! Power-up defaults (type K, no filter, continuous conversion) are kept. The
//! hot-junction register is a signed 16-bit value in 1/16 °C.

use async_trait::async_trait;
use embedded_hal::blocking::i2c;
use std::fmt::Debug;

use super::TemperatureSensor;
use crate::error::{AppResult, DaqError};

/// Address with the ADDR pin floating.
pub const DEFAULT_ADDRESS: u8 = 0x67;

const REG_HOT_JUNCTION: u8 = 0x00;
const REG_DEVICE_ID: u8 = 0x20;
const DEVICE_ID: u8 = 0x40;

/// MCP9600 thermocouple input.
pub struct Mcp9600<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C, E> Mcp9600<I2C>
where
    I2C: i2c::WriteRead<Error = E>,
    E: Debug,
{
    /// Check the device ID at `address`.
    pub fn new(mut bus: I2C, address: u8) -> AppResult<Self> {
        let mut id = [0u8; 2];
        bus.write_read(address, &[REG_DEVICE_ID], &mut id)
            .map_err(|e| DaqError::Sensor(format!("MCP9600: Reading device ID failed: {:?}", e)))?;
        if id[0] != DEVICE_ID {
            return Err(DaqError::Sensor(format!(
                "MCP9600: Unexpected device ID {:#04x}",
                id[0]
            )));
        }
        Ok(Self { bus, address })
    }

    /// Release the I2C bus.
    pub fn destroy(self) -> I2C {
        self.bus
    }
}

#[async_trait]
impl<I2C, E> TemperatureSensor for Mcp9600<I2C>
where
    I2C: i2c::WriteRead<Error = E> + Send,
    E: Debug,
{
    fn name(&self) -> &str {
        "MCP9600"
    }

    async fn read_celsius(&mut self) -> AppResult<f64> {
        let mut raw = [0u8; 2];
        self.bus
            .write_read(self.address, &[REG_HOT_JUNCTION], &mut raw)
            .map_err(|e| {
                DaqError::Sensor(format!("MCP9600: Reading temperature failed: {:?}", e))
            })?;
        Ok(f64::from(i16::from_be_bytes(raw)) / 16.0)
    }
}
