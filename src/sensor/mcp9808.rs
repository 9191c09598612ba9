//! MCP9808 ambient temperature sensor on an `embedded-hal` I2C bus.
//!
//! The chip converts continuously after power-up at 0.0625 °C resolution, so
//! the driver only checks the manufacturer ID and reads the ambient register.

use async_trait::async_trait;
use embedded_hal::blocking::i2c;
use std::fmt::Debug;

use super::TemperatureSensor;
use crate::error::{AppResult, DaqError};

/// Address with A0..A2 tied low.
pub const DEFAULT_ADDRESS: u8 = 0x18;

const REG_AMBIENT: u8 = 0x05;
const REG_MANUFACTURER_ID: u8 = 0x06;
const MANUFACTURER_ID: u16 = 0x0054;

const SIGN: u16 = 0x1000;
const MAGNITUDE: u16 = 0x0FFF;

/// Temperature from the ambient register. The three alert flag bits are ignored.
pub fn celsius_from_raw(raw: u16) -> f64 {
    let magnitude = f64::from(raw & MAGNITUDE) / 16.0;
    if raw & SIGN != 0 {
        magnitude - 256.0
    } else {
        magnitude
    }
}

/// MCP9808 temperature sensor.
pub struct Mcp9808<I2C> {
    bus: I2C,
    address: u8,
}

impl<I2C, E> Mcp9808<I2C>
where
    I2C: i2c::WriteRead<Error = E>,
    E: Debug,
{
    /// Check the manufacturer ID at `address`.
    pub fn new(bus: I2C, address: u8) -> AppResult<Self> {
        let mut sensor = Self { bus, address };
        let id = sensor
            .read_register(REG_MANUFACTURER_ID)
            .map_err(|e| DaqError::Sensor(format!("MCP9808: Reading ID failed: {:?}", e)))?;
        if id != MANUFACTURER_ID {
            return Err(DaqError::Sensor(format!(
                "MCP9808: Unexpected manufacturer ID {:#06x}",
                id
            )));
        }
        Ok(sensor)
    }

    /// Release the I2C bus.
    pub fn destroy(self) -> I2C {
        self.bus
    }

    fn read_register(&mut self, register: u8) -> Result<u16, E> {
        let mut raw = [0u8; 2];
        self.bus.write_read(self.address, &[register], &mut raw)?;
        Ok(u16::from_be_bytes(raw))
    }
}

#[async_trait]
impl<I2C, E> TemperatureSensor for Mcp9808<I2C>
where
    I2C: i2c::WriteRead<Error = E> + Send,
    E: Debug,
{
    fn name(&self) -> &str {
        "MCP9808"
    }

    async fn read_celsius(&mut self) -> AppResult<f64> {
        let raw = self
            .read_register(REG_AMBIENT)
            .map_err(|e| {
                DaqError::Sensor(format!("MCP9808: Reading temperature failed: {:?}", e))
            })?;
        Ok(celsius_from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RegisterBus {
        manufacturer: u16,
        ambient: [u8; 2],
    }

    impl i2c::WriteRead for RegisterBus {
        type Error = &'static str;

        fn write_read(
            &mut self,
            address: u8,
            bytes: &[u8],
            buffer: &mut [u8],
        ) -> Result<(), Self::Error> {
            if address != DEFAULT_ADDRESS {
                return Err("nack");
            }
            match bytes[0] {
                REG_MANUFACTURER_ID => buffer.copy_from_slice(&self.manufacturer.to_be_bytes()),
                REG_AMBIENT => buffer.copy_from_slice(&self.ambient),
                _ => return Err("unknown register"),
            }
            Ok(())
        }
    }

    fn bus(ambient: [u8; 2]) -> RegisterBus {
        RegisterBus {
            manufacturer: MANUFACTURER_ID,
            ambient,
        }
    }

    #[test]
    fn test_raw_conversion() {
        assert_eq!(celsius_from_raw(0x0190), 25.0);
        assert_eq!(celsius_from_raw(0x01A4), 26.25);
        assert_eq!(celsius_from_raw(0x1F60), -10.0);
        // Alert flags set
        assert_eq!(celsius_from_raw(0xE190), 25.0);
    }

    #[tokio::test]
    async fn test_reads_negative_temperature() {
        let mut sensor = Mcp9808::new(bus([0xFF, 0x60]), DEFAULT_ADDRESS).unwrap();
        assert_eq!(sensor.read_celsius().await.unwrap(), -10.0);
    }

    #[test]
    fn test_missing_device_is_rejected() {
        assert!(Mcp9808::new(bus([0, 0]), 0x19).is_err());

        let mut wrong = bus([0, 0]);
        wrong.manufacturer = 0x1234;
        let err = Mcp9808::new(wrong, DEFAULT_ADDRESS).err().unwrap();
        assert!(err.to_string().contains("manufacturer ID"));
    }
}
