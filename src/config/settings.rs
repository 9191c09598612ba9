//! Layered settings loaded with Figment.
//!
//! Every section implements `Default`, so an empty TOML file (or no file at all)
//! yields a usable configuration: simulated TSL2591, 0.1 s polling, no automatic
//! stop condition.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppResult, DaqError};
use crate::sensor::LightSensorModel;

/// Default location of the TOML configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/lumen_daq.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "LUMEN_DAQ_";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Acquisition timing and stop conditions
    pub run: RunSettings,
    /// Record file settings
    pub output: OutputSettings,
    /// Light sensor selection
    pub sensor: SensorSettings,
    /// Temperature sensor selection
    pub temperature: TemperatureSettings,
    /// Status LEDs
    pub indicator: IndicatorSettings,
    /// Lamp model for the simulated backends
    pub simulation: SimulationSettings,
    /// Diagnostic logging
    pub logging: LoggingSettings,
}

/// Acquisition timing and stop conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Seconds between measurements while recording
    pub poll_interval_secs: f64,
    /// Stop after recording for this many minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_mins: Option<f64>,
    /// Stop once output stays at or below this percentage of the 30 s reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_percentage: Option<f64>,
    /// Percentage-point change between printed progress updates (0 disables)
    pub print_percentage: f64,
    /// Minutes between printed progress updates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print_interval_mins: Option<f64>,
    /// Record time relative to light onset
    pub relative_time: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 0.1,
            max_duration_mins: None,
            termination_percentage: None,
            print_percentage: 5.0,
            print_interval_mins: None,
            relative_time: false,
        }
    }
}

/// Record file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputSettings {
    /// CSV file to write; a timestamped name is generated when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Lux to lumen conversion factor of a calibrated integrating enclosure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lux_to_lumen_factor: Option<f64>,
    /// Refuse to start unless the lumens column can be filled
    pub require_lumens: bool,
}

/// Where light readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LightBackend {
    /// Built-in lamp model
    Simulated,
    /// Probe answering `READ` queries on a serial port
    Serial,
    /// TSL2591 or VEML7700 (per `sensor.model`) on a Linux I2C bus
    I2c,
}

/// Where temperature readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBackend {
    /// No temperature column
    None,
    /// Built-in warm-up model
    Simulated,
    /// Probe answering `READ` queries on a serial port
    Serial,
    /// MCP9808 ambient sensor on a Linux I2C bus
    Mcp9808,
    /// MCP9600 thermocouple amplifier on a Linux I2C bus
    Mcp9600,
}

impl TemperatureBackend {
    fn uses_i2c(self) -> bool {
        matches!(self, Self::Mcp9808 | Self::Mcp9600)
    }
}

/// How the ready / running / complete states are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorBackend {
    /// Log state changes only
    Virtual,
    /// LEDs on GPIO lines
    Gpio,
}

/// Light sensor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSettings {
    /// Sensor chip, determines the saturation ceiling
    pub model: LightSensorModel,
    /// Reading source
    pub backend: LightBackend,
    /// Serial port (e.g., "/dev/ttyUSB0")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Query timeout in milliseconds
    pub timeout_ms: u64,
    /// I2C bus device
    pub i2c_bus: PathBuf,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            model: LightSensorModel::Tsl2591,
            backend: LightBackend::Simulated,
            serial_port: None,
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            i2c_bus: default_i2c_bus(),
        }
    }
}

/// Temperature sensor selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSettings {
    /// Reading source
    pub backend: TemperatureBackend,
    /// Serial port (e.g., "/dev/ttyUSB1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_port: Option<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Query timeout in milliseconds
    pub timeout_ms: u64,
    /// I2C bus device
    pub i2c_bus: PathBuf,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            backend: TemperatureBackend::None,
            serial_port: None,
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
            i2c_bus: default_i2c_bus(),
        }
    }
}

/// Status LED wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    /// Output kind
    pub backend: IndicatorBackend,
    /// Sysfs GPIO number of the ready LED
    pub ready_pin: u64,
    /// Sysfs GPIO number of the running LED
    pub running_pin: u64,
    /// Sysfs GPIO number of the complete LED
    pub complete_pin: u64,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            backend: IndicatorBackend::Virtual,
            ready_pin: 17,
            running_pin: 27,
            complete_pin: 22,
        }
    }
}

impl IndicatorSettings {
    /// Pins in ready, running, complete order.
    pub fn pins(&self) -> [u64; 3] {
        [self.ready_pin, self.running_pin, self.complete_pin]
    }
}

/// Lamp and enclosure model used by the simulated backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Light level before the lamp is switched on
    pub ambient_lux: f64,
    /// Light level right after switch-on
    pub peak_lux: f64,
    /// Seconds after start-up at which the lamp switches on
    pub switch_on_after_secs: f64,
    /// Minutes for the output to halve
    pub half_life_mins: f64,
    /// Relative noise amplitude (0.01 = 1 %)
    pub noise_fraction: f64,
    /// Enclosure temperature at start-up
    pub ambient_celsius: f64,
    /// Temperature the enclosure settles at
    pub peak_celsius: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            ambient_lux: 5.0,
            peak_lux: 20_000.0,
            switch_on_after_secs: 5.0,
            half_life_mins: 30.0,
            noise_fraction: 0.01,
            ambient_celsius: 22.0,
            peak_celsius: 45.0,
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Logging level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_i2c_bus() -> PathBuf {
    PathBuf::from("/dev/i2c-1")
}

impl Settings {
    /// Build the layered Figment: defaults, TOML file, then `LUMEN_DAQ_` variables.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from the default location.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment overrides apply.
    ///
    /// # Errors
    ///
    /// Returns `DaqError::Config` if a source cannot be parsed and
    /// `DaqError::Configuration` if the merged values are invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let settings: Self = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from a file and apply a final provider on top (used for CLI flags).
    pub fn load_with<P: AsRef<Path>, T: Provider>(path: P, overrides: T) -> AppResult<Self> {
        let settings: Self = Self::figment(path).merge(overrides).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Timing values are positive
    /// - Termination percentage is within (0, 100]
    /// - Conversion factor is positive, and present when lumens are required
    /// - Serial backends name a port and a non-zero timeout
    /// - I2C backends name a bus, GPIO LEDs use distinct pins
    /// - Simulation parameters are finite and in range
    /// - Log level is valid
    pub fn validate(&self) -> AppResult<()> {
        let run = &self.run;
        if !(run.poll_interval_secs.is_finite() && run.poll_interval_secs > 0.0) {
            return Err(invalid(format!(
                "poll_interval_secs must be positive, got {}",
                run.poll_interval_secs
            )));
        }
        if let Some(minutes) = run.max_duration_mins {
            if !(minutes.is_finite() && minutes > 0.0) {
                return Err(invalid(format!(
                    "max_duration_mins must be positive, got {minutes}"
                )));
            }
        }
        if let Some(percentage) = run.termination_percentage {
            if !(percentage > 0.0 && percentage <= 100.0) {
                return Err(invalid(format!(
                    "termination_percentage must be within (0, 100], got {percentage}"
                )));
            }
        }
        if !(run.print_percentage.is_finite() && run.print_percentage >= 0.0) {
            return Err(invalid(format!(
                "print_percentage cannot be negative, got {}",
                run.print_percentage
            )));
        }
        if let Some(minutes) = run.print_interval_mins {
            if !(minutes.is_finite() && minutes > 0.0) {
                return Err(invalid(format!(
                    "print_interval_mins must be positive, got {minutes}"
                )));
            }
        }

        match self.output.lux_to_lumen_factor {
            Some(factor) if !(factor.is_finite() && factor > 0.0) => {
                return Err(invalid(format!(
                    "lux_to_lumen_factor must be positive, got {factor}"
                )));
            }
            None if self.output.require_lumens => {
                return Err(invalid(
                    "require_lumens is set but no lux_to_lumen_factor was given".to_string(),
                ));
            }
            _ => {}
        }

        if self.sensor.backend == LightBackend::Serial {
            if port_missing(&self.sensor.serial_port) {
                return Err(invalid(
                    "sensor backend 'serial' requires sensor.serial_port".to_string(),
                ));
            }
            if self.sensor.timeout_ms == 0 {
                return Err(invalid("sensor.timeout_ms must be positive".to_string()));
            }
        }
        if self.sensor.backend == LightBackend::I2c && self.sensor.i2c_bus.as_os_str().is_empty() {
            return Err(invalid(
                "sensor backend 'i2c' requires sensor.i2c_bus".to_string(),
            ));
        }
        if self.temperature.backend == TemperatureBackend::Serial {
            if port_missing(&self.temperature.serial_port) {
                return Err(invalid(
                    "temperature backend 'serial' requires temperature.serial_port".to_string(),
                ));
            }
            if self.temperature.timeout_ms == 0 {
                return Err(invalid(
                    "temperature.timeout_ms must be positive".to_string(),
                ));
            }
        }
        if self.temperature.backend.uses_i2c() && self.temperature.i2c_bus.as_os_str().is_empty()
        {
            return Err(invalid(
                "I2C temperature backends require temperature.i2c_bus".to_string(),
            ));
        }

        if self.indicator.backend == IndicatorBackend::Gpio {
            let [ready, running, complete] = self.indicator.pins();
            if ready == running || ready == complete || running == complete {
                return Err(invalid(format!(
                    "indicator pins must be distinct, got {ready}, {running}, {complete}"
                )));
            }
        }

        self.simulation.validate()?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }
}

impl SimulationSettings {
    fn validate(&self) -> AppResult<()> {
        let values = [
            ("ambient_lux", self.ambient_lux),
            ("peak_lux", self.peak_lux),
            ("switch_on_after_secs", self.switch_on_after_secs),
            ("half_life_mins", self.half_life_mins),
            ("noise_fraction", self.noise_fraction),
            ("ambient_celsius", self.ambient_celsius),
            ("peak_celsius", self.peak_celsius),
        ];
        if let Some((name, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(invalid(format!(
                "simulation.{name} must be finite, got {value}"
            )));
        }
        for (name, value) in [
            ("ambient_lux", self.ambient_lux),
            ("peak_lux", self.peak_lux),
            ("switch_on_after_secs", self.switch_on_after_secs),
        ] {
            if value < 0.0 {
                return Err(invalid(format!(
                    "simulation.{name} cannot be negative, got {value}"
                )));
            }
        }
        if self.half_life_mins <= 0.0 {
            return Err(invalid(format!(
                "simulation.half_life_mins must be positive, got {}",
                self.half_life_mins
            )));
        }
        if !(0.0..1.0).contains(&self.noise_fraction) {
            return Err(invalid(format!(
                "simulation.noise_fraction must be within [0, 1), got {}",
                self.noise_fraction
            )));
        }
        Ok(())
    }
}

fn port_missing(port: &Option<String>) -> bool {
    port.as_deref().map_or(true, str::is_empty)
}

fn invalid(message: String) -> DaqError {
    DaqError::Configuration(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.run.print_percentage, 5.0);
        assert_eq!(settings.sensor.model, LightSensorModel::Tsl2591);
    }

    #[test]
    fn test_missing_lumen_factor_fails_fast() {
        let mut settings = Settings::default();
        settings.output.require_lumens = true;

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, DaqError::Configuration(_)));
        assert!(err.to_string().contains("lux_to_lumen_factor"));

        settings.output.lux_to_lumen_factor = Some(12.5);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_termination_percentage() {
        let mut settings = Settings::default();
        settings.run.termination_percentage = Some(0.0);
        assert!(settings.validate().is_err());

        settings.run.termination_percentage = Some(150.0);
        assert!(settings.validate().is_err());

        settings.run.termination_percentage = Some(100.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_poll_interval() {
        let mut settings = Settings::default();
        settings.run.poll_interval_secs = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_simulation_values() {
        let mut settings = Settings::default();
        settings.simulation.noise_fraction = f64::INFINITY;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("noise_fraction"));

        settings.simulation.noise_fraction = 1.0;
        assert!(settings.validate().is_err());
        settings.simulation.noise_fraction = -0.1;
        assert!(settings.validate().is_err());
        settings.simulation.noise_fraction = 0.0;
        assert!(settings.validate().is_ok());

        settings.simulation.half_life_mins = 0.0;
        assert!(settings.validate().is_err());
        settings.simulation.half_life_mins = 30.0;

        settings.simulation.peak_lux = -1.0;
        assert!(settings.validate().is_err());
        settings.simulation.peak_lux = 20_000.0;

        settings.simulation.ambient_lux = f64::NAN;
        assert!(settings.validate().is_err());
        settings.simulation.ambient_lux = -5.0;
        assert!(settings.validate().is_err());
        settings.simulation.ambient_lux = 5.0;

        settings.simulation.ambient_celsius = -10.0;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_infinite_noise_in_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\nnoise_fraction = inf").unwrap();

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, DaqError::Configuration(_)));
        assert!(err.to_string().contains("noise_fraction"));
    }

    #[test]
    fn test_serial_backend_requires_timeout() {
        let mut settings = Settings::default();
        settings.sensor.backend = LightBackend::Serial;
        settings.sensor.serial_port = Some("/dev/ttyUSB0".to_string());
        settings.sensor.timeout_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sensor.timeout_ms"));
        settings.sensor.timeout_ms = 1000;

        settings.temperature.backend = TemperatureBackend::Serial;
        settings.temperature.serial_port = Some("/dev/ttyUSB1".to_string());
        settings.temperature.timeout_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("temperature.timeout_ms"));

        // Unused serial timeouts are not checked
        settings.temperature.backend = TemperatureBackend::None;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_i2c_backends_and_gpio_pins() {
        let mut settings = Settings::default();
        settings.sensor.backend = LightBackend::I2c;
        settings.temperature.backend = TemperatureBackend::Mcp9808;
        settings.indicator.backend = IndicatorBackend::Gpio;
        assert!(settings.validate().is_ok());

        settings.sensor.i2c_bus = PathBuf::new();
        assert!(settings.validate().is_err());
        settings.sensor.i2c_bus = PathBuf::from("/dev/i2c-1");

        settings.temperature.i2c_bus = PathBuf::new();
        assert!(settings.validate().is_err());
        settings.temperature.i2c_bus = PathBuf::from("/dev/i2c-1");

        settings.indicator.complete_pin = settings.indicator.ready_pin;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("distinct"));
    }

    #[test]
    fn test_serial_backend_requires_port() {
        let mut settings = Settings::default();
        settings.sensor.backend = LightBackend::Serial;
        assert!(settings.validate().is_err());

        settings.sensor.serial_port = Some("/dev/ttyUSB0".to_string());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();

        let result = settings.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[run]
poll_interval_secs = 2.0
termination_percentage = 10.0
relative_time = true

[output]
lux_to_lumen_factor = 38.2

[sensor]
model = "veml7700"
backend = "i2c"

[temperature]
backend = "mcp9600"

[indicator]
backend = "gpio"
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.run.poll_interval_secs, 2.0);
        assert_eq!(settings.run.termination_percentage, Some(10.0));
        assert!(settings.run.relative_time);
        assert_eq!(settings.run.print_percentage, 5.0);
        assert_eq!(settings.output.lux_to_lumen_factor, Some(38.2));
        assert_eq!(settings.sensor.model, LightSensorModel::Veml7700);
        assert_eq!(settings.sensor.backend, LightBackend::I2c);
        assert_eq!(settings.sensor.i2c_bus, PathBuf::from("/dev/i2c-1"));
        assert_eq!(settings.temperature.backend, TemperatureBackend::Mcp9600);
        assert_eq!(settings.indicator.pins(), [17, 27, 22]);
        assert_eq!(settings.indicator.backend, IndicatorBackend::Gpio);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\npoll_interval_secs = 2.0").unwrap();

        let overrides = Serialized::defaults(toml::toml! {
            [run]
            poll_interval_secs = 0.5
        });
        let settings = Settings::load_with(file.path(), overrides).unwrap();
        assert_eq!(settings.run.poll_interval_secs, 0.5);
    }

    #[test]
    fn test_invalid_file_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nprint_interval_mins = -1.0").unwrap();

        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, DaqError::Configuration(_)));
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/lumen_daq.example.toml");
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .extract()
            .unwrap();
        assert_eq!(settings, Settings::default());
    }
}
