//! Command-line entry point.
//!
//! ```text
//! lumen_daq -o torch.csv -d 90 --tp 10 -r
//! ```

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use figment::providers::Serialized;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use lumen_daq::acquisition::Acquisition;
use lumen_daq::config::{
    IndicatorBackend, LightBackend, RunConfig, Settings, TemperatureBackend, DEFAULT_CONFIG_PATH,
};
use lumen_daq::error::{AppResult, DaqError};
use lumen_daq::indicator::{self, Indicator, VirtualIndicator};
use lumen_daq::logging;
use lumen_daq::report::{messages, ConsoleReporter, Reporter};
use lumen_daq::sensor::{
    i2c, LightSensor, LightSensorModel, SerialProbe, SimulatedLamp, SimulatedThermometer,
    TemperatureSensor, ThermometerChip,
};
use lumen_daq::storage::{default_output_path, resolve_output_path, CsvRecordSink, RowFormat};

/// Record the runtime of a light source.
///
/// Calibrates against ambient light, waits for the source to be switched on,
/// records its output and stops on its own once the output has decayed.
#[derive(Parser, Debug)]
#[command(about, version)]
struct Args {
    /// Configuration file (missing file is fine)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// CSV file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seconds between measurements
    #[arg(short, long)]
    interval: Option<f64>,

    /// Stop after recording for this many minutes
    #[arg(short, long)]
    duration: Option<f64>,

    /// Stop once output stays at or below this percentage of the 30 s reference
    #[arg(long = "termination-percentage", visible_alias = "tp")]
    termination_percentage: Option<f64>,

    /// Print progress whenever output moves by this many percentage points (0 disables)
    #[arg(long = "print-percentage", visible_alias = "pp")]
    print_percentage: Option<f64>,

    /// Print progress at least every this many minutes
    #[arg(long = "print-delay", visible_alias = "pd")]
    print_delay: Option<f64>,

    /// Lux to lumen conversion factor of a calibrated enclosure
    #[arg(long = "lux-to-lumen-factor", visible_alias = "lf")]
    lux_to_lumen_factor: Option<f64>,

    /// Record time relative to light onset
    #[arg(short, long)]
    relative_time: bool,

    /// Light sensor chip
    #[arg(long = "light-sensor", visible_alias = "ls", value_enum)]
    light_sensor: Option<LightSensorModel>,

    /// Where light readings come from
    #[arg(long, value_enum)]
    backend: Option<LightBackend>,

    /// Where temperature readings come from
    #[arg(long = "temp-sensor", visible_alias = "ts", value_enum)]
    temp_sensor: Option<TemperatureBackend>,

    /// How ready / running / complete are shown
    #[arg(long, value_enum)]
    indicator: Option<IndicatorBackend>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Command-line values layered on top of file and environment settings.
#[derive(Debug, Default, Serialize)]
struct Overrides {
    run: RunOverrides,
    output: OutputOverrides,
    sensor: SensorOverrides,
    temperature: TemperatureOverrides,
    indicator: IndicatorOverrides,
    logging: LoggingOverrides,
}

#[derive(Debug, Default, Serialize)]
struct RunOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    poll_interval_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_duration_mins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    termination_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    print_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    print_interval_mins: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relative_time: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
struct OutputOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lux_to_lumen_factor: Option<f64>,
}

#[derive(Debug, Default, Serialize)]
struct SensorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<LightSensorModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<LightBackend>,
}

#[derive(Debug, Default, Serialize)]
struct TemperatureOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<TemperatureBackend>,
}

#[derive(Debug, Default, Serialize)]
struct IndicatorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<IndicatorBackend>,
}

#[derive(Debug, Default, Serialize)]
struct LoggingOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            run: RunOverrides {
                poll_interval_secs: self.interval,
                max_duration_mins: self.duration,
                termination_percentage: self.termination_percentage,
                print_percentage: self.print_percentage,
                print_interval_mins: self.print_delay,
                relative_time: self.relative_time.then_some(true),
            },
            output: OutputOverrides {
                path: self.output.clone(),
                lux_to_lumen_factor: self.lux_to_lumen_factor,
            },
            sensor: SensorOverrides {
                model: self.light_sensor,
                backend: self.backend,
            },
            temperature: TemperatureOverrides {
                backend: self.temp_sensor,
            },
            indicator: IndicatorOverrides {
                backend: self.indicator,
            },
            logging: LoggingOverrides {
                level: self.log_level.clone(),
            },
        }
    }
}

fn light_sensor(settings: &Settings) -> AppResult<Box<dyn LightSensor>> {
    let sensor = &settings.sensor;
    match sensor.backend {
        LightBackend::Simulated => Ok(Box::new(SimulatedLamp::new(
            sensor.model,
            settings.simulation.clone(),
        ))),
        LightBackend::Serial => {
            let port = sensor.serial_port.as_deref().ok_or_else(|| {
                DaqError::Configuration("sensor.serial_port is required".to_string())
            })?;
            let probe = SerialProbe::open(
                port,
                sensor.baud_rate,
                Duration::from_millis(sensor.timeout_ms),
            )?
            .with_ceiling(sensor.model.ceiling());
            Ok(Box::new(probe))
        }
        LightBackend::I2c => i2c::open_light_sensor(sensor.model, &sensor.i2c_bus),
    }
}

fn temperature_sensor(settings: &Settings) -> AppResult<Option<Box<dyn TemperatureSensor>>> {
    let temperature = &settings.temperature;
    match temperature.backend {
        TemperatureBackend::None => Ok(None),
        TemperatureBackend::Simulated => Ok(Some(Box::new(SimulatedThermometer::new(
            &settings.simulation,
        )))),
        TemperatureBackend::Serial => {
            let port = temperature.serial_port.as_deref().ok_or_else(|| {
                DaqError::Configuration("temperature.serial_port is required".to_string())
            })?;
            let probe = SerialProbe::open(
                port,
                temperature.baud_rate,
                Duration::from_millis(temperature.timeout_ms),
            )?;
            Ok(Some(Box::new(probe)))
        }
        TemperatureBackend::Mcp9808 => {
            i2c::open_thermometer(ThermometerChip::Mcp9808, &temperature.i2c_bus).map(Some)
        }
        TemperatureBackend::Mcp9600 => {
            i2c::open_thermometer(ThermometerChip::Mcp9600, &temperature.i2c_bus).map(Some)
        }
    }
}

fn status_indicator(settings: &Settings) -> AppResult<Box<dyn Indicator>> {
    match settings.indicator.backend {
        IndicatorBackend::Virtual => Ok(Box::new(VirtualIndicator::new())),
        IndicatorBackend::Gpio => Ok(Box::new(indicator::open_gpio(settings.indicator.pins())?)),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = Settings::load_with(&args.config, Serialized::defaults(args.overrides()))
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;

    if args.print_config {
        print!("{}", toml::to_string(&settings)?);
        return Ok(());
    }

    logging::init(&settings.logging.level)?;
    let config = RunConfig::try_from(&settings)?;
    let mut reporter = ConsoleReporter::new();

    let now = Local::now();
    let requested = settings
        .output
        .path
        .clone()
        .unwrap_or_else(|| default_output_path(now));
    let path = resolve_output_path(&requested, now);
    if path != requested {
        reporter.warn(&messages::file_exists(&requested));
    }
    reporter.info(&messages::saving_as(&path));

    let sink = CsvRecordSink::create(&path, RowFormat::from(&config))
        .with_context(|| format!("Failed to create record file {:?}", path))?;
    let light = light_sensor(&settings).context("Failed to set up the light sensor")?;
    let status = status_indicator(&settings).context("Failed to set up the status LEDs")?;
    let mut acquisition = Acquisition::new(
        config,
        light,
        status,
        Box::new(sink),
        Box::new(reporter),
    );
    if let Some(sensor) =
        temperature_sensor(&settings).context("Failed to set up the temperature sensor")?
    {
        acquisition = acquisition.with_temperature(sensor);
    }

    tokio::select! {
        result = acquisition.run() => {
            let summary = result.inspect_err(|e| error!("Run aborted: {}", e))?;
            println!("{}", summary);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            println!("Interrupted. Rows recorded so far are in {}", path.display());
        }
    }

    Ok(())
}
