//! VEML7700 ambient light sensor on an `embedded-hal` I2C bus.
//!
//! Uses the `veml6030` driver (the VEML7700 shares its register map). The sensor
//! is configured for the brightest range: gain 1/8 with 100 ms integration, which
//! saturates at roughly 120 klx.

use async_trait::async_trait;
use embedded_hal::blocking::i2c;
use std::fmt::Debug;
use veml6030::{Gain, IntegrationTime, SlaveAddr, Veml6030};

use super::{LightSensor, LightSensorModel};
use crate::error::{AppResult, DaqError};

const INTEGRATION_TIME: IntegrationTime = IntegrationTime::Ms100;

/// VEML7700 light sensor.
pub struct Veml7700<I2C> {
    device: Veml6030<I2C>,
}

impl<I2C, E> Veml7700<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E>,
    E: Debug,
{
    /// Configure gain and integration time, then power the sensor on.
    pub fn new(bus: I2C) -> AppResult<Self> {
        let mut device = Veml6030::new(bus, SlaveAddr::default());
        device
            .set_gain(Gain::OneEighth)
            .map_err(|e| DaqError::Sensor(format!("VEML7700: Setting gain failed: {:?}", e)))?;
        device.set_integration_time(INTEGRATION_TIME).map_err(|e| {
            DaqError::Sensor(format!(
                "VEML7700: Setting integration time failed: {:?}",
                e
            ))
        })?;
        device
            .enable()
            .map_err(|e| DaqError::Sensor(format!("VEML7700: Enabling failed: {:?}", e)))?;
        Ok(Self { device })
    }

    /// Release the I2C bus.
    pub fn destroy(self) -> I2C {
        self.device.destroy()
    }
}

#[async_trait]
impl<I2C, E> LightSensor for Veml7700<I2C>
where
    I2C: i2c::Write<Error = E> + i2c::WriteRead<Error = E> + Send,
    E: Debug,
{
    fn name(&self) -> &str {
        "VEML7700"
    }

    fn ceiling(&self) -> f64 {
        LightSensorModel::Veml7700.ceiling()
    }

    async fn read_lux(&mut self) -> AppResult<f64> {
        let lux = self
            .device
            .read_lux()
            .map_err(|e| DaqError::Sensor(format!("VEML7700: Reading lux failed: {:?}", e)))?;
        Ok(f64::from(lux).min(self.ceiling()))
    }
}
