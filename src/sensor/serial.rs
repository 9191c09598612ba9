//! Serial-attached probes.
//!
//! A probe is a small microcontroller board that owns the actual sensor chip and
//! answers each `READ\n` query with one line holding a single number: lux for a
//! light probe, °C for a temperature probe. The same [`SerialProbe`] type serves
//! both roles.
//!
//! The serialport crate is blocking, so each query runs on Tokio's blocking pool.

use async_trait::async_trait;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use super::{LightSensor, TemperatureSensor};
use crate::error::{AppResult, DaqError};

/// Query sent to the probe for each reading.
pub const QUERY: &[u8] = b"READ\n";

/// Parse one reply line into a reading.
pub fn parse_reading(line: &str) -> AppResult<f64> {
    let trimmed = line.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| DaqError::Sensor(format!("unparseable probe reply {:?}", trimmed)))?;
    if !value.is_finite() {
        return Err(DaqError::Sensor(format!("non-finite probe reply {:?}", trimmed)));
    }
    Ok(value)
}

/// Parse a light probe reply. Lux cannot be negative; temperatures can.
pub fn parse_lux(line: &str) -> AppResult<f64> {
    let value = parse_reading(line)?;
    if value < 0.0 {
        return Err(DaqError::Sensor(format!(
            "negative lux in probe reply {:?}",
            line.trim()
        )));
    }
    Ok(value)
}

/// Send a query and collect the reply up to the newline delimiter.
pub fn exchange<P: Read + Write + ?Sized>(port: &mut P, timeout: Duration) -> AppResult<String> {
    port.write_all(QUERY)
        .and_then(|_| port.flush())
        .map_err(|e| DaqError::Sensor(format!("failed to send query: {e}")))?;

    let start = Instant::now();
    let mut response: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        if start.elapsed() > timeout {
            return Err(DaqError::Sensor(format!(
                "serial read timeout after {:?}",
                timeout
            )));
        }

        match port.read(&mut byte) {
            Ok(0) => {
                return Err(DaqError::Sensor(
                    "probe closed the connection before replying".to_string(),
                ))
            }
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => response.push(byte[0]),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {
                continue
            }
            Err(e) => return Err(DaqError::Sensor(format!("serial read failed: {e}"))),
        }
    }

    Ok(String::from_utf8_lossy(&response).trim().to_string())
}

#[cfg(feature = "instrument_serial")]
mod serial_enabled {
    use super::*;
    use serialport::{ClearBuffer, SerialPort};
    use std::sync::{Arc, Mutex};
    use tracing::debug;

    /// A probe on a serial port.
    pub struct SerialProbe {
        name: String,
        ceiling: f64,
        timeout: Duration,
        port: Arc<Mutex<Box<dyn SerialPort>>>,
    }

    impl SerialProbe {
        /// Open the port. `ceiling` is only meaningful for light probes.
        pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> AppResult<Self> {
            let port = serialport::new(port_name, baud_rate)
                .timeout(Duration::from_millis(100))
                .open()
                .map_err(|e| {
                    DaqError::Sensor(format!(
                        "Failed to open serial port '{}' at {} baud: {}",
                        port_name, baud_rate, e
                    ))
                })?;

            debug!(port = port_name, baud_rate, "Serial probe opened");

            Ok(Self {
                name: format!("Serial probe ({port_name})"),
                ceiling: f64::MAX,
                timeout,
                port: Arc::new(Mutex::new(port)),
            })
        }

        /// Set the saturation ceiling reported through [`LightSensor::ceiling`].
        pub fn with_ceiling(mut self, ceiling: f64) -> Self {
            self.ceiling = ceiling;
            self
        }

        async fn query(&self) -> AppResult<String> {
            let port = Arc::clone(&self.port);
            let timeout = self.timeout;

            let line = tokio::task::spawn_blocking(move || {
                let mut guard = port
                    .lock()
                    .map_err(|_| DaqError::Sensor("serial port lock poisoned".to_string()))?;
                guard
                    .clear(ClearBuffer::Input)
                    .map_err(|e| DaqError::Sensor(format!("failed to clear input: {e}")))?;
                exchange(&mut **guard, timeout)
            })
            .await
            .map_err(|e| DaqError::Sensor(format!("serial query task failed: {e}")))??;

            debug!(probe = %self.name, reply = %line, "Probe replied");
            Ok(line)
        }
    }

    #[async_trait]
    impl LightSensor for SerialProbe {
        fn name(&self) -> &str {
            &self.name
        }

        fn ceiling(&self) -> f64 {
            self.ceiling
        }

        async fn read_lux(&mut self) -> AppResult<f64> {
            parse_lux(&self.query().await?)
        }
    }

    #[async_trait]
    impl TemperatureSensor for SerialProbe {
        fn name(&self) -> &str {
            &self.name
        }

        async fn read_celsius(&mut self) -> AppResult<f64> {
            parse_reading(&self.query().await?)
        }
    }
}

#[cfg(not(feature = "instrument_serial"))]
mod serial_disabled {
    use super::*;

    /// Placeholder when serial support is compiled out.
    pub struct SerialProbe;

    impl SerialProbe {
        /// Always fails: serial support is not part of this build.
        pub fn open(_port_name: &str, _baud_rate: u32, _timeout: Duration) -> AppResult<Self> {
            Err(DaqError::FeatureNotEnabled("instrument_serial".to_string()))
        }

        /// No-op without serial support.
        pub fn with_ceiling(self, _ceiling: f64) -> Self {
            self
        }
    }

    #[async_trait]
    impl LightSensor for SerialProbe {
        fn name(&self) -> &str {
            "Serial probe (disabled)"
        }

        fn ceiling(&self) -> f64 {
            f64::MAX
        }

        async fn read_lux(&mut self) -> AppResult<f64> {
            Err(DaqError::FeatureNotEnabled("instrument_serial".to_string()))
        }
    }

    #[async_trait]
    impl TemperatureSensor for SerialProbe {
        fn name(&self) -> &str {
            "Serial probe (disabled)"
        }

        async fn read_celsius(&mut self) -> AppResult<f64> {
            Err(DaqError::FeatureNotEnabled("instrument_serial".to_string()))
        }
    }
}

#[cfg(feature = "instrument_serial")]
pub use serial_enabled::SerialProbe;

#[cfg(not(feature = "instrument_serial"))]
pub use serial_disabled::SerialProbe;
